//! MemTable implementation
//!
//! BTreeMap-based table of live records.

use std::collections::btree_map;
use std::collections::BTreeMap;

/// In-memory table of live records, ordered by key bytes
#[derive(Debug, Default)]
pub struct MemTable {
    data: BTreeMap<Vec<u8>, Vec<u8>>,

    /// Approximate size in bytes (sum of key and value lengths)
    size: usize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }

    /// Check for a key without touching its value
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.data.contains_key(key)
    }

    /// Put a key-value pair, returning the new approximate size
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let key_len = key.len();
        let value_len = value.len();
        match self.data.insert(key, value) {
            // Key bytes were already counted
            Some(old) => self.size = self.size - old.len() + value_len,
            None => self.size += key_len + value_len,
        }
        self.size
    }

    /// Remove a key, returning its value if it was present
    pub fn delete(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let removed = self.data.remove(key)?;
        self.size -= key.len() + removed.len();
        Some(removed)
    }

    /// Remove and return the entry with the smallest key
    pub fn pop_first(&mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        let (key, value) = self.data.pop_first()?;
        self.size -= key.len() + value.len();
        Some((key, value))
    }

    /// The entry with the smallest key
    pub fn first(&self) -> Option<(&[u8], &[u8])> {
        self.data
            .first_key_value()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all entries in sorted key order
    pub fn iter(&self) -> MemTableIter<'_> {
        MemTableIter {
            inner: self.data.iter(),
        }
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.data.clear();
        self.size = 0;
    }
}

/// Iterator over MemTable entries in sorted key order
pub struct MemTableIter<'a> {
    inner: btree_map::Iter<'a, Vec<u8>, Vec<u8>>,
}

impl<'a> Iterator for MemTableIter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
