//! Store session
//!
//! An open, exclusively owned handle on a store directory.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::memtable::{MemTable, MemTableIter};
use crate::storage::write_snapshot;
use crate::wal::{Operation, WalWriter};

use super::lock::StoreLock;

/// An open store
///
/// Every mutation is appended to the WAL before it is applied to the
/// in-memory table. Iteration order is ascending key bytes.
///
/// [`close`](Session::close) syncs the WAL, compacts when the WAL has grown
/// past the configured threshold, and releases the lock. Dropping a
/// session without closing it syncs best-effort and releases the lock;
/// the WAL is replayed on the next open either way.
pub struct Session {
    dir: PathBuf,
    snapshot_path: PathBuf,
    table: MemTable,
    wal: WalWriter,
    compaction_threshold: usize,
    closed: bool,

    // Declared last so it is released after everything above is dropped
    _lock: StoreLock,
}

impl Session {
    pub(super) fn new(
        dir: PathBuf,
        snapshot_path: PathBuf,
        table: MemTable,
        wal: WalWriter,
        compaction_threshold: usize,
        lock: StoreLock,
    ) -> Self {
        Self {
            dir,
            snapshot_path,
            table,
            wal,
            compaction_threshold,
            closed: false,
            _lock: lock,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.table.get(key)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.table.contains_key(key)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.table.entry_count()
    }

    /// Alias of [`len`](Session::len)
    pub fn count(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Records in storage order
    pub fn iter(&self) -> MemTableIter<'_> {
        self.table.iter()
    }

    /// Visit every record in storage order
    pub fn each(&self, mut visit: impl FnMut(&[u8], &[u8])) {
        for (key, value) in self.table.iter() {
            visit(key, value);
        }
    }

    /// The first record in storage order
    pub fn first(&self) -> Option<(&[u8], &[u8])> {
        self.table.first()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert or overwrite a record
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.wal.append(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;
        self.table.put(key.to_vec(), value.to_vec());
        Ok(())
    }

    /// Remove a record; returns false (and logs nothing) if it was absent
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        if !self.table.contains_key(key) {
            return Ok(false);
        }
        self.wal.append(Operation::Delete { key: key.to_vec() })?;
        self.table.delete(key);
        Ok(true)
    }

    /// Remove and return the first record in storage order
    pub fn shift(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let key = match self.table.first() {
            Some((key, _)) => key.to_vec(),
            None => return Ok(None),
        };
        self.wal.append(Operation::Delete { key })?;
        Ok(self.table.pop_first())
    }

    /// Remove every record
    pub fn clear(&mut self) -> Result<()> {
        if self.table.is_empty() {
            return Ok(());
        }
        self.wal.append(Operation::Clear)?;
        self.table.clear();
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Fold the WAL into a fresh snapshot now
    pub fn compact(&mut self) -> Result<()> {
        self.wal.sync()?;
        let meta = write_snapshot(&self.snapshot_path, &self.table)?;
        self.wal.truncate()?;

        tracing::debug!(
            store = %self.dir.display(),
            entries = meta.entry_count,
            file_size = meta.file_size,
            "Compacted WAL into snapshot"
        );
        Ok(())
    }

    /// Sync, compact if due, and release the store
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        // Set first: a failed close must not be retried from Drop
        self.closed = true;

        self.wal.sync()?;

        let wal_entries = self.wal.entry_count();
        if wal_entries > 0 && wal_entries >= self.compaction_threshold as u64 {
            self.compact()?;
        }

        tracing::debug!(
            store = %self.dir.display(),
            records = self.table.entry_count(),
            wal_entries = self.wal.entry_count(),
            "Session closed"
        );
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The store directory
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Entries in the WAL that are not yet folded into the snapshot
    pub fn wal_entry_count(&self) -> u64 {
        self.wal.entry_count()
    }

    /// Approximate bytes held by live records
    pub fn size_bytes(&self) -> usize {
        self.table.size()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.wal.sync() {
            tracing::warn!(
                store = %self.dir.display(),
                error = %e,
                "WAL sync failed while dropping an unclosed session"
            );
        }
    }
}
