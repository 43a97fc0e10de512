//! Cabinet
//!
//! A hashmap-shaped facade over a [`Store`] directory.
//!
//! ## Session Discipline
//! No handle is held between calls. Every operation opens a session,
//! does its work, and closes it again before returning, on success and
//! on failure alike. Bulk operations (`replace`, `update`, `delete_if`)
//! run inside a single session.
//!
//! ## Keys and Values
//! Keys are anything [`Display`]; `123` and `"123"` name the same record.
//! Values go through the [`codec`](crate::codec) and come back as `V`.
//!
//! ## Reentrancy
//! Visitors and predicates run while the session is open. Calling back
//! into a cabinet on the same directory from inside one fails with
//! [`CabinetError::StorageUnavailable`](crate::CabinetError::StorageUnavailable) rather than deadlocking.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec;
use crate::config::Config;
use crate::error::Result;
use crate::pair_source::PairSource;
use crate::store::{Session, Store};
use crate::value::Value;

/// A persistent map of string keys to `V` values
///
/// ```
/// use hashcabinet::{Cabinet, Value};
///
/// let dir = tempfile::tempdir().unwrap();
/// let bands: Cabinet = Cabinet::new(dir.path().join("bands"));
///
/// bands.set("pantera", Value::map([("active_to", "2003")])).unwrap();
/// assert!(bands.has_key("pantera").unwrap());
/// assert_eq!(bands.get("slayer").unwrap(), None);
/// ```
pub struct Cabinet<V = Value> {
    config: Config,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Cabinet<V> {
    /// Bind to a directory with default settings; nothing is opened yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_config(Config::builder().data_dir(path).build())
    }

    /// Bind with explicit settings
    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            _marker: PhantomData,
        }
    }

    /// The bound directory
    pub fn path(&self) -> &Path {
        &self.config.data_dir
    }

    /// Settings every session is opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `op` against a freshly opened session
    ///
    /// The session is always released before this returns. An error from
    /// `op` wins; otherwise an error closing the session is returned.
    pub fn with_session<T>(&self, op: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        let mut session = Store::open(&self.config)?;
        match op(&mut session) {
            Ok(out) => {
                session.close()?;
                Ok(out)
            }
            Err(e) => {
                drop(session);
                Err(e)
            }
        }
    }

    /// Fold the WAL into the snapshot now rather than at the next threshold
    pub fn compact(&self) -> Result<()> {
        self.with_session(|session| session.compact())
    }

    // =========================================================================
    // Untyped Operations
    // =========================================================================

    pub fn has_key(&self, key: impl Display) -> Result<bool> {
        let key = codec::normalize_key(&key);
        self.with_session(|session| Ok(session.contains_key(key.as_bytes())))
    }

    /// Alias of [`has_key`](Cabinet::has_key)
    pub fn contains_key(&self, key: impl Display) -> Result<bool> {
        self.has_key(key)
    }

    /// Alias of [`has_key`](Cabinet::has_key)
    pub fn include(&self, key: impl Display) -> Result<bool> {
        self.has_key(key)
    }

    /// Remove a record; `Ok(false)` if there was none
    pub fn delete(&self, key: impl Display) -> Result<bool> {
        let key = codec::normalize_key(&key);
        self.with_session(|session| session.delete(key.as_bytes()))
    }

    /// Remove every record
    pub fn clear(&self) -> Result<()> {
        self.with_session(|session| session.clear())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.with_session(|session| Ok(session.is_empty()))
    }

    /// Number of records
    pub fn len(&self) -> Result<usize> {
        self.with_session(|session| Ok(session.len()))
    }

    pub fn length(&self) -> Result<usize> {
        self.len()
    }

    pub fn size(&self) -> Result<usize> {
        self.len()
    }

    pub fn count(&self) -> Result<usize> {
        self.len()
    }

    /// All keys in storage order
    pub fn keys(&self) -> Result<Vec<String>> {
        self.with_session(|session| {
            session
                .iter()
                .map(|(key, _)| codec::key_from_bytes(key).map(str::to_string))
                .collect()
        })
    }

    /// Visit every key in storage order
    pub fn each_key(&self, mut visitor: impl FnMut(&str)) -> Result<()> {
        self.with_session(|session| {
            for (key, _) in session.iter() {
                visitor(codec::key_from_bytes(key)?);
            }
            Ok(())
        })
    }
}

impl<V: Serialize + DeserializeOwned> Cabinet<V> {
    // =========================================================================
    // Point Operations
    // =========================================================================

    /// The value at `key`, or `None` if there is no such record
    pub fn get(&self, key: impl Display) -> Result<Option<V>> {
        let key = codec::normalize_key(&key);
        self.with_session(|session| codec::from_bytes_or_null(session.get(key.as_bytes())))
    }

    /// Store `value` at `key`, overwriting any previous value
    pub fn set(&self, key: impl Display, value: impl Into<V>) -> Result<()> {
        let key = codec::normalize_key(&key);
        let value: V = value.into();
        let bytes = codec::serialize(&value)?;
        self.with_session(|session| session.put(key.as_bytes(), &bytes))
    }

    /// One entry per requested key, in request order
    pub fn values_at<K, I>(&self, keys: I) -> Result<Vec<Option<V>>>
    where
        K: Display,
        I: IntoIterator<Item = K>,
    {
        let keys: Vec<String> = keys.into_iter().map(|k| codec::normalize_key(&k)).collect();
        self.with_session(|session| {
            keys.iter()
                .map(|key| codec::from_bytes_or_null(session.get(key.as_bytes())))
                .collect()
        })
    }

    /// Remove and return the first record in storage order
    pub fn shift(&self) -> Result<Option<(String, V)>> {
        self.with_session(|session| {
            // Decode before removing so a bad record is left in place
            let record = match session.first() {
                Some((key, value)) => (
                    codec::key_from_bytes(key)?.to_string(),
                    codec::deserialize::<V>(value)?,
                ),
                None => return Ok(None),
            };
            session.shift()?;
            Ok(Some(record))
        })
    }

    // =========================================================================
    // Whole-Collection Operations
    // =========================================================================

    /// All values, in the same order as [`keys`](Cabinet::keys)
    pub fn values(&self) -> Result<Vec<V>> {
        self.with_session(|session| {
            session
                .iter()
                .map(|(_, value)| codec::deserialize::<V>(value))
                .collect()
        })
    }

    /// All records in storage order
    pub fn to_pairs(&self) -> Result<Vec<(String, V)>> {
        self.with_session(|session| session.iter().map(decode_record::<V>).collect())
    }

    /// All records as a map
    pub fn to_map(&self) -> Result<BTreeMap<String, V>> {
        Ok(self.to_pairs()?.into_iter().collect())
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Visit every record in storage order
    pub fn each(&self, mut visitor: impl FnMut(&str, &V)) -> Result<()> {
        self.with_session(|session| {
            for record in session.iter() {
                let (key, value) = decode_record::<V>(record)?;
                visitor(&key, &value);
            }
            Ok(())
        })
    }

    pub fn each_value(&self, mut visitor: impl FnMut(&V)) -> Result<()> {
        self.each(|_, value| visitor(value))
    }

    /// Records for which `predicate` holds
    pub fn select(&self, mut predicate: impl FnMut(&str, &V) -> bool) -> Result<BTreeMap<String, V>> {
        self.with_session(|session| {
            let mut selected = BTreeMap::new();
            for record in session.iter() {
                let (key, value) = decode_record::<V>(record)?;
                if predicate(&key, &value) {
                    selected.insert(key, value);
                }
            }
            Ok(selected)
        })
    }

    /// Remove every record for which `predicate` holds; returns how many
    ///
    /// Matching keys are collected during the scan and deleted afterwards,
    /// all in one session.
    pub fn delete_if(&self, mut predicate: impl FnMut(&str, &V) -> bool) -> Result<usize> {
        self.with_session(|session| {
            let mut doomed = Vec::new();
            for (key, value) in session.iter() {
                let name = codec::key_from_bytes(key)?;
                let value: V = codec::deserialize(value)?;
                if predicate(name, &value) {
                    doomed.push(key.to_vec());
                }
            }
            for key in &doomed {
                session.delete(key)?;
            }
            Ok(doomed.len())
        })
    }

    // =========================================================================
    // Bulk Operations
    // =========================================================================

    /// Make `data` the entire contents
    ///
    /// Everything is encoded before the store is touched, so a value that
    /// cannot be serialized leaves the cabinet as it was.
    pub fn replace(&self, data: impl Into<PairSource<V>>) -> Result<()>
    where
        V: Display,
    {
        let records = data.into().encode()?;
        self.with_session(|session| {
            session.clear()?;
            write_records(session, &records)
        })
    }

    /// Upsert every record in `data`
    pub fn update(&self, data: impl Into<PairSource<V>>) -> Result<()>
    where
        V: Display,
    {
        let records = data.into().encode()?;
        self.with_session(|session| write_records(session, &records))
    }
}

impl<V: Serialize + DeserializeOwned + PartialEq> Cabinet<V> {
    /// Whether any record holds `value` (full scan)
    pub fn has_value(&self, value: &V) -> Result<bool> {
        Ok(self.key_for(value)?.is_some())
    }

    /// Alias of [`has_value`](Cabinet::has_value)
    pub fn contains_value(&self, value: &V) -> Result<bool> {
        self.has_value(value)
    }

    /// The first key in storage order whose value equals `value`
    pub fn key_for(&self, value: &V) -> Result<Option<String>> {
        self.with_session(|session| {
            for record in session.iter() {
                let (key, candidate) = decode_record::<V>(record)?;
                if &candidate == value {
                    return Ok(Some(key));
                }
            }
            Ok(None)
        })
    }
}

impl<V> Clone for Cabinet<V> {
    fn clone(&self) -> Self {
        Self::from_config(self.config.clone())
    }
}

impl<V> fmt::Debug for Cabinet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cabinet")
            .field("path", &self.config.data_dir)
            .finish()
    }
}

fn decode_record<V: DeserializeOwned>((key, value): (&[u8], &[u8])) -> Result<(String, V)> {
    Ok((
        codec::key_from_bytes(key)?.to_string(),
        codec::deserialize(value)?,
    ))
}

fn write_records(session: &mut Session, records: &[(String, Vec<u8>)]) -> Result<()> {
    for (key, value) in records {
        session.put(key.as_bytes(), value)?;
    }
    Ok(())
}
