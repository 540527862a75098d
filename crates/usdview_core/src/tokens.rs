//! Interned tokens for schema type names.
//!
//! A [`Tokens`] table is built once at startup and handed around by
//! reference (usually behind an `Arc`). Tokens resolved through the table
//! share storage, so equality is a pointer comparison in the common case.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An immutable, cheaply clonable string used for fast symbol comparison.
#[derive(Clone)]
pub struct Token(Arc<str>);

impl Token {
    /// Create a token that is not backed by any table
    pub fn new(s: &str) -> Self {
        Token(Arc::from(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Token {
    fn default() -> Self {
        Token::new("")
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?})", &*self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-wide token table.
///
/// Construct with [`Tokens::new`] once, then pass `&Tokens` (or an
/// `Arc<Tokens>`) to whatever needs symbol lookups. The table never changes
/// after construction.
pub struct Tokens {
    // Prim type names
    pub xform: Token,
    pub scope: Token,
    pub mesh: Token,
    pub cube: Token,
    pub sphere: Token,
    pub camera: Token,
    pub dome_light: Token,
    pub distant_light: Token,

    table: HashMap<Arc<str>, Token>,
}

impl Tokens {
    pub fn new() -> Self {
        let mut table = HashMap::new();
        let mut make = |s: &str| {
            let token = Token::new(s);
            table.insert(token.0.clone(), token.clone());
            token
        };

        Self {
            xform: make("Xform"),
            scope: make("Scope"),
            mesh: make("Mesh"),
            cube: make("Cube"),
            sphere: make("Sphere"),
            camera: make("Camera"),
            dome_light: make("DomeLight"),
            distant_light: make("DistantLight"),
            table,
        }
    }

    /// Look up a token already present in the table
    pub fn get(&self, s: &str) -> Option<&Token> {
        self.table.get(s)
    }

    /// Return the table's token for `s`, or a fresh unshared one
    pub fn resolve(&self, s: &str) -> Token {
        self.get(s).cloned().unwrap_or_else(|| Token::new(s))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for Tokens {
    fn default() -> Self {
        Self::new()
    }
}
