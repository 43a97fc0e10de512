//! Store Module
//!
//! The embedded byte-keyed store underneath a cabinet.
//!
//! ## Responsibilities
//! - Open a store directory for exclusive use
//! - Rebuild the live table from the snapshot plus the WAL
//! - Hand out a [`Session`] offering get/put/delete/clear/iterate/count
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   ├── LOCK      advisory lock, holder pid
//!   ├── data.sst  snapshot of live records (SSTable format)
//!   └── wal.log   mutations since the snapshot
//! ```
//!
//! ## Concurrency
//! Opens of one directory are serialized within a process and rejected
//! across processes; see the `lock` module. Nothing is shared between
//! sessions except the files.

mod lock;
mod session;

use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{CabinetError, Result};
use crate::memtable::MemTable;
use crate::storage::load_snapshot;
use crate::wal::{Operation, RecoveryResult, WalRecovery, WalWriter};

use lock::StoreLock;
pub use session::Session;

/// Entry point for opening sessions
pub struct Store;

impl Store {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SNAPSHOT_FILENAME: &'static str = "data.sst";

    /// Open a session on the store at `config.data_dir`
    ///
    /// On open:
    /// 1. Create the directory if allowed
    /// 2. Take the lock
    /// 3. Load the snapshot
    /// 4. Recover the WAL and replay it on top
    ///
    /// Any failure here is reported as
    /// [`CabinetError::StorageUnavailable`]; invalid settings are
    /// [`CabinetError::Config`].
    pub fn open(config: &Config) -> Result<Session> {
        config.validate()?;
        Self::open_inner(config).map_err(|e| CabinetError::unavailable(&config.data_dir, e))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Session> {
        let config = Config::builder().data_dir(path).build();
        Self::open(&config)
    }

    fn open_inner(config: &Config) -> Result<Session> {
        let dir = &config.data_dir;

        if !dir.exists() {
            if !config.create_if_missing {
                return Err(CabinetError::StorageUnavailable {
                    path: dir.clone(),
                    reason: "directory does not exist".to_string(),
                });
            }
            fs::create_dir_all(dir)?;
        }
        if !dir.is_dir() {
            return Err(CabinetError::StorageUnavailable {
                path: dir.clone(),
                reason: "not a directory".to_string(),
            });
        }

        let lock = StoreLock::acquire(dir, config.lock_timeout)?;

        let snapshot_path = dir.join(Self::SNAPSHOT_FILENAME);
        let mut table = load_snapshot(&snapshot_path)?;

        let wal_path = dir.join(Self::WAL_FILENAME);
        let recovered = if wal_path.exists() {
            let (entries, result) = WalRecovery::recover(&wal_path)?;
            for entry in entries {
                apply(&mut table, entry.operation);
            }
            result
        } else {
            RecoveryResult::default()
        };

        let wal = WalWriter::resume(&wal_path, config.wal_sync_strategy, &recovered)?;

        tracing::debug!(
            store = %dir.display(),
            records = table.entry_count(),
            wal_replayed = recovered.entries_recovered,
            wal_truncated = recovered.was_truncated,
            "Session opened"
        );

        Ok(Session::new(
            dir.clone(),
            snapshot_path,
            table,
            wal,
            config.compaction_threshold,
            lock,
        ))
    }
}

/// Replay one logged operation onto the table
fn apply(table: &mut MemTable, operation: Operation) {
    match operation {
        Operation::Put { key, value } => {
            table.put(key, value);
        }
        Operation::Delete { key } => {
            table.delete(&key);
        }
        Operation::Clear => table.clear(),
    }
}
