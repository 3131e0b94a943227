//! Identifier interning.
//!
//! Attribute and member names are looked up by identity in type
//! dictionaries and MRO searches, which only pays off if equal strings
//! share one allocation: a process-lifetime pool of leaked,
//! hash-and-eq-by-content strings, handed out as `'static` references so
//! every other structure in the type system can hash and compare
//! interned names by pointer.
//!
//! This is intentionally narrow: building a full `str` builtin (ropes,
//! encoding, slicing, formatting) is out of scope — that's a concrete
//! built-in type left to an external collaborator. Only the
//! identifier-sized slice this core itself needs is implemented.

use std::fmt;
use std::hash::{Hash, Hasher};

use pytype_common::lock::PyRwLock;

/// An interned string. Equality and hashing are by pointer identity, which
/// is sound because [`StringPool::intern`] guarantees at most one
/// `'static` allocation per distinct string content.
pub struct PyStrInterned {
    value: String,
}

impl PyStrInterned {
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for PyStrInterned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

impl fmt::Display for PyStrInterned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl PartialEq for PyStrInterned {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}
impl Eq for PyStrInterned {}

impl Hash for PyStrInterned {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self as *const Self).hash(state)
    }
}

/// Process-wide table mapping string content to its single `'static`
/// interned allocation.
///
/// A linear scan per lookup is fine at the scale this core interns at
/// (dunder and attribute names, not arbitrary user strings); a HashSet
/// keyed by content would need a second hash/eq impl alongside the
/// pointer-identity one `PyStrInterned` needs for its ordinary use as a
/// dict key, which isn't worth the duplication here.
pub struct StringPool {
    pool: PyRwLock<Vec<&'static PyStrInterned>>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        Self {
            pool: PyRwLock::new(Vec::new()),
        }
    }

    /// Interns `s`, returning the single process-lifetime allocation for
    /// its content. Subsequent calls with equal content return the same
    /// reference.
    pub fn intern(&self, s: impl AsRef<str>) -> &'static PyStrInterned {
        let s = s.as_ref();
        if let Some(existing) = self.pool.read().iter().find(|i| i.as_str() == s) {
            return existing;
        }
        let mut guard = self.pool.write();
        if let Some(existing) = guard.iter().find(|i| i.as_str() == s) {
            return existing;
        }
        let leaked: &'static PyStrInterned = Box::leak(Box::new(PyStrInterned {
            value: s.to_owned(),
        }));
        guard.push(leaked);
        leaked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_content_interns_to_one_allocation() {
        let pool = StringPool::new();
        let a = pool.intern("__repr__");
        let b = pool.intern(String::from("__repr__"));
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn distinct_content_interns_separately() {
        let pool = StringPool::new();
        let a = pool.intern("__repr__");
        let b = pool.intern("__str__");
        assert!(!std::ptr::eq(a, b));
        assert_eq!(a.as_str(), "__repr__");
        assert_eq!(b.as_str(), "__str__");
    }
}
