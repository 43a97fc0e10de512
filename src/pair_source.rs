//! Bulk input for `replace` and `update`

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::hash::BuildHasher;

use serde::Serialize;

use crate::codec;
use crate::error::Result;
use crate::value::Value;

/// Records to write in one session
///
/// A `Mapping` is written as-is. A `Sequence` stores every item under its
/// own string form, so `[123, "456"]` becomes `{"123": 123, "456": "456"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum PairSource<V = Value> {
    Mapping(Vec<(String, V)>),
    Sequence(Vec<V>),
}

impl<V> PairSource<V> {
    /// A mapping from any displayable keys
    pub fn pairs<K, I>(pairs: I) -> Self
    where
        K: Display,
        I: IntoIterator<Item = (K, V)>,
    {
        PairSource::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (codec::normalize_key(&k), v))
                .collect(),
        )
    }

    /// A sequence of self-keyed items
    pub fn items<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<V>,
    {
        PairSource::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            PairSource::Mapping(pairs) => pairs.len(),
            PairSource::Sequence(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Serialize + Display> PairSource<V> {
    /// Normalize keys and encode values, ready for the store
    pub(crate) fn encode(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut records = Vec::with_capacity(self.len());
        match self {
            PairSource::Mapping(pairs) => {
                for (key, value) in pairs {
                    records.push((key.clone(), codec::serialize(value)?));
                }
            }
            PairSource::Sequence(items) => {
                for item in items {
                    records.push((codec::normalize_key(item), codec::serialize(item)?));
                }
            }
        }
        Ok(records)
    }
}

impl<K: Display, V> From<BTreeMap<K, V>> for PairSource<V> {
    fn from(map: BTreeMap<K, V>) -> Self {
        PairSource::pairs(map)
    }
}

impl<K: Display, V, S: BuildHasher> From<HashMap<K, V, S>> for PairSource<V> {
    fn from(map: HashMap<K, V, S>) -> Self {
        PairSource::pairs(map)
    }
}

impl<V> From<Vec<V>> for PairSource<V> {
    fn from(items: Vec<V>) -> Self {
        PairSource::Sequence(items)
    }
}

