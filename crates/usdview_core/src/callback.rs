//! Registry of long-lived callbacks.
//!
//! Native notice and diagnostic hooks may fire at any time for the rest of
//! the process, so registered closures are held by strong `Arc` references
//! until they are explicitly unregistered.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type Callback<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// Identifies one registration; pass it back to
/// [`CallbackRegistry::unregister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallbackHandle(u64);

/// Thread-safe set of callbacks taking `&A`.
pub struct CallbackRegistry<A> {
    next_id: AtomicU64,
    callbacks: Mutex<BTreeMap<u64, Callback<A>>>,
}

impl<A> Default for CallbackRegistry<A> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            callbacks: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<A> CallbackRegistry<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, Arc::new(callback));
        CallbackHandle(id)
    }

    /// Drop the registration. Returns false if it was already removed.
    pub fn unregister(&self, handle: CallbackHandle) -> bool {
        self.lock().remove(&handle.0).is_some()
    }

    /// Call every callback in registration order.
    ///
    /// The set is snapshotted first, so callbacks may register or
    /// unregister without deadlocking.
    pub fn invoke(&self, arg: &A) {
        let snapshot: Vec<Callback<A>> = self.lock().values().cloned().collect();
        for callback in snapshot {
            callback(arg);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, Callback<A>>> {
        // Callbacks never run under the lock; a poisoned map is still whole
        self.callbacks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_invoke_in_registration_order() {
        let registry = CallbackRegistry::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l1 = log.clone();
        registry.register(move |v| l1.lock().unwrap().push(("first", *v)));
        let l2 = log.clone();
        registry.register(move |v| l2.lock().unwrap().push(("second", *v)));

        registry.invoke(&7);
        assert_eq!(*log.lock().unwrap(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_unregister() {
        let registry = CallbackRegistry::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let handle = registry.register(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        registry.invoke(&());
        assert!(registry.unregister(handle));
        assert!(!registry.unregister(handle));
        registry.invoke(&());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_callback_can_unregister_itself() {
        let registry = Arc::new(CallbackRegistry::<()>::new());
        let handle_slot: Arc<Mutex<Option<CallbackHandle>>> = Arc::new(Mutex::new(None));

        let reg = Arc::downgrade(&registry);
        let slot = handle_slot.clone();
        let handle = registry.register(move |_| {
            if let (Some(reg), Some(h)) = (reg.upgrade(), *slot.lock().unwrap()) {
                reg.unregister(h);
            }
        });
        *handle_slot.lock().unwrap() = Some(handle);

        registry.invoke(&());
        assert_eq!(registry.len(), 0);
    }
}
