//! Key/value extension fields
//!
//! Open-ended per-object attributes. Keys and values are interned strings
//! and lookups compare keys by identity, so callers holding a `SharedStr`
//! get the fast path; the `World` wrappers intern on the caller's behalf.
//! Entries are kept newest first.

use crate::shstr::SharedStr;

/// One association
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: SharedStr,
    /// `None` records an explicit override to empty of an archetype key
    pub value: Option<SharedStr>,
}

/// Association list of an object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValues(Vec<KeyValue>);

impl KeyValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    /// Entry for `key`, compared by identity
    pub fn entry(&self, key: &SharedStr) -> Option<&KeyValue> {
        self.0.iter().find(|kv| kv.key == *key)
    }

    /// Value for `key`, `None` if absent or explicitly empty
    pub fn get(&self, key: &SharedStr) -> Option<&SharedStr> {
        self.entry(key).and_then(|kv| kv.value.as_ref())
    }

    pub fn contains(&self, key: &SharedStr) -> bool {
        self.entry(key).is_some()
    }

    /// Set `key` to `value`.
    ///
    /// An existing entry is updated in place. Clearing an entry keeps it with
    /// an empty value when `keep_empty` is set (the archetype defines the key),
    /// otherwise the entry is dropped. A missing key is only added when
    /// `add_key` is set and the value is not empty. Returns false only when
    /// the key is missing and `add_key` is false.
    pub fn set(
        &mut self,
        key: SharedStr,
        value: Option<SharedStr>,
        add_key: bool,
        keep_empty: bool,
    ) -> bool {
        if let Some(pos) = self.0.iter().position(|kv| kv.key == key) {
            match value {
                Some(v) => self.0[pos].value = Some(v),
                None if keep_empty => self.0[pos].value = None,
                None => {
                    self.0.remove(pos);
                }
            }
            return true;
        }

        if !add_key {
            return false;
        }
        if let Some(v) = value {
            self.0.insert(0, KeyValue { key, value: Some(v) });
        }
        true
    }

    /// Every key of `wants` is present in `has` with the same value.
    pub fn subset_of(wants: &KeyValues, has: &KeyValues) -> bool {
        wants.0.iter().all(|kv| match has.entry(&kv.key) {
            Some(other) => other.value == kv.value,
            None => false,
        })
    }

    /// Set equality of two lists
    pub fn same_set(a: &KeyValues, b: &KeyValues) -> bool {
        Self::subset_of(a, b) && Self::subset_of(b, a)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
