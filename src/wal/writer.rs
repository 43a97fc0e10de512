//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{CabinetError, Result};

use super::{Operation, RecoveryResult, WalEntry, WalRecovery};

/// Writes entries to the WAL file
pub struct WalWriter {
    /// Location of the log file
    path: PathBuf,

    /// Buffered append handle
    writer: BufWriter<File>,

    /// LSN the next appended entry receives
    next_lsn: u64,

    /// When to fsync
    sync_strategy: WalSyncStrategy,

    /// Entries written since the last sync
    uncommitted: usize,

    /// Entries currently in the file
    entry_count: u64,

    /// Set once a write or flush fails; the file may end in a torn frame
    poisoned: bool,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// Continues numbering after the last valid entry. A file with a torn
    /// tail is refused: appending after garbage would hide the new entries
    /// from recovery, so run [`WalRecovery::recover`] first.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let scan = if path.exists() {
            WalRecovery::verify(path)?
        } else {
            RecoveryResult::default()
        };

        if scan.entries_corrupted > 0 {
            return Err(CabinetError::WalCorruption(format!(
                "{} has an unrecovered torn tail after LSN {}",
                path.display(),
                scan.last_lsn
            )));
        }

        Self::resume(path, sync_strategy, &scan)
    }

    /// Open after the caller already ran recovery on `path`
    pub fn resume(
        path: &Path,
        sync_strategy: WalSyncStrategy,
        recovered: &RecoveryResult,
    ) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            next_lsn: recovered.last_lsn + 1,
            sync_strategy,
            uncommitted: 0,
            entry_count: recovered.entries_recovered,
            poisoned: false,
        })
    }

    /// Append an operation to the WAL, returning the LSN it was given
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        self.check_poisoned()?;

        let lsn = self.next_lsn;
        let frame = WalEntry::new(lsn, operation).serialize()?;

        // Anything appended after a partial frame would be lost to recovery
        if let Err(e) = self.writer.write_all(&frame) {
            self.poisoned = true;
            return Err(e.into());
        }
        self.next_lsn += 1;
        self.entry_count += 1;
        self.uncommitted += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.uncommitted >= count,
        };
        if due {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.check_poisoned()?;
        if let Err(e) = self.writer.flush() {
            self.poisoned = true;
            return Err(e.into());
        }
        self.writer.get_ref().sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Discard every entry and restart numbering at 1
    ///
    /// Only safe once the entries are durable elsewhere (a snapshot).
    pub fn truncate(&mut self) -> Result<()> {
        self.check_poisoned()?;
        self.writer.flush()?;
        let file = self.writer.get_ref();
        file.set_len(0)?;
        file.sync_all()?;

        self.next_lsn = 1;
        self.entry_count = 0;
        self.uncommitted = 0;
        Ok(())
    }

    /// Get the LSN the next entry will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Entries written but not yet synced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Entries currently held in the log file
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an earlier write failed and the writer refuses further use
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn check_poisoned(&self) -> Result<()> {
        if self.poisoned {
            return Err(CabinetError::WalCorruption(format!(
                "{} is unusable after a failed write",
                self.path.display()
            )));
        }
        Ok(())
    }
}
