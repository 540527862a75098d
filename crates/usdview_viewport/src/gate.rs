//! Bounds the number of frames in flight.

use std::sync::{Condvar, Mutex, MutexGuard};

/// Counting semaphore guarding frame submission.
///
/// The render loop takes one permit per frame; with a single permit a new
/// frame cannot start encoding until the previous one has been presented.
/// The gate is `Send + Sync` and can be shared through an `Arc`.
#[derive(Debug)]
pub struct InFlightGate {
    permits: Mutex<usize>,
    available: Condvar,
}

/// RAII permit; dropping it returns the permit to its gate.
#[derive(Debug)]
#[must_use = "the permit is released as soon as it is dropped"]
pub struct FramePermit<'a> {
    gate: &'a InFlightGate,
}

impl Default for InFlightGate {
    fn default() -> Self {
        Self::new(1)
    }
}

impl InFlightGate {
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Block until a permit is free and take it.
    pub fn acquire(&self) -> FramePermit<'_> {
        let mut permits = self.lock();
        while *permits == 0 {
            permits = self
                .available
                .wait(permits)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *permits -= 1;
        FramePermit { gate: self }
    }

    /// Take a permit only if one is free right now.
    pub fn try_acquire(&self) -> Option<FramePermit<'_>> {
        let mut permits = self.lock();
        if *permits == 0 {
            return None;
        }
        *permits -= 1;
        Some(FramePermit { gate: self })
    }

    /// Permits currently free
    pub fn available(&self) -> usize {
        *self.lock()
    }

    fn release(&self) {
        *self.lock() += 1;
        self.available.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.permits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for FramePermit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
