//! Shared (interned) strings
//!
//! Names, messages and key-value entries are interned once per world and
//! shared by reference. A `SharedStr` releases its reference when dropped,
//! so copying and clearing objects never has to balance counts by hand.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use hashbrown::HashSet;

/// Handle to an interned string.
///
/// Equality is identity: two handles are equal only if they come from the
/// same table entry. Use [`SharedStr::as_str`] for content comparison.
#[derive(Clone)]
pub struct SharedStr(Rc<str>);

impl SharedStr {
    /// String contents
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if both handles point at the same interned entry
    pub fn ptr_eq(a: &SharedStr, b: &SharedStr) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for SharedStr {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SharedStr {}

impl Deref for SharedStr {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SharedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for SharedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compare two optional shared strings by identity.
pub fn same(a: &Option<SharedStr>, b: &Option<SharedStr>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => SharedStr::ptr_eq(a, b),
        _ => false,
    }
}

/// Interning table
#[derive(Debug, Default)]
pub struct StringTable {
    strings: HashSet<Rc<str>>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning the shared handle.
    pub fn intern(&mut self, s: &str) -> SharedStr {
        if let Some(existing) = self.strings.get(s) {
            return SharedStr(Rc::clone(existing));
        }
        let rc: Rc<str> = Rc::from(s);
        self.strings.insert(Rc::clone(&rc));
        SharedStr(rc)
    }

    /// Look up an already interned string without creating it.
    pub fn find(&self, s: &str) -> Option<SharedStr> {
        self.strings.get(s).map(|rc| SharedStr(Rc::clone(rc)))
    }

    /// Number of live handles to `s`, not counting the table itself.
    pub fn refcount(&self, s: &str) -> usize {
        self.strings
            .get(s)
            .map(|rc| Rc::strong_count(rc) - 1)
            .unwrap_or(0)
    }

    /// Drop every entry no handle refers to any more. Returns how many were dropped.
    pub fn purge(&mut self) -> usize {
        let before = self.strings.len();
        self.strings.retain(|rc| Rc::strong_count(rc) > 1);
        before - self.strings.len()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
