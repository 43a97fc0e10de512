//! Configuration for hashcabinet
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CabinetError, Result};

/// Configuration for a cabinet and the store underneath it
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the store files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── LOCK             (advisory lock file)
    ///     ├── data.sst         (snapshot of all live records)
    ///     └── wal.log          (write-ahead log since the snapshot)
    pub data_dir: PathBuf,

    /// Create `data_dir` when it does not exist yet
    pub create_if_missing: bool,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL while a session is open.
    /// Closing a session always syncs.
    pub wal_sync_strategy: WalSyncStrategy,

    /// Fold the WAL into a fresh snapshot on close once it holds at least
    /// this many entries
    pub compaction_threshold: usize,

    // -------------------------------------------------------------------------
    // Locking Configuration
    // -------------------------------------------------------------------------
    /// How long an open waits for another thread of this process to
    /// release the same store
    pub lock_timeout: Duration,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./cabinet_data"),
            create_if_missing: true,
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            compaction_threshold: 256,
            lock_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the store cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(CabinetError::Config("data_dir must not be empty".to_string()));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(CabinetError::Config(
                "EveryNEntries sync strategy needs a count of at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (the cabinet's bound location)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Create the data directory on first open
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the number of WAL entries that triggers compaction on close
    pub fn compaction_threshold(mut self, entries: usize) -> Self {
        self.config.compaction_threshold = entries;
        self
    }

    /// Set how long to wait for another thread holding the store
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = timeout;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
