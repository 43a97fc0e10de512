//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{CabinetError, Result};

use super::{WalEntry, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    ///
    /// Framing cannot be trusted past the first bad entry, so everything
    /// from there on counts as a single corrupted tail.
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL was truncated (partial writes removed)
    pub was_truncated: bool,

    /// Length of the valid prefix in bytes
    pub valid_len: u64,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Detect the first corrupted or partial entry
    /// 3. Truncate the file there
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut entries = Vec::new();
        let mut result = Self::scan(path, |entry| entries.push(entry))?;

        if result.entries_corrupted > 0 {
            tracing::warn!(
                wal = %path.display(),
                valid_len = result.valid_len,
                last_lsn = result.last_lsn,
                "Truncating torn WAL tail"
            );

            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(result.valid_len)?;
            file.sync_all()?;
            result.was_truncated = true;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::scan(path, |_| {})
    }

    fn scan(path: &Path, mut visit: impl FnMut(WalEntry)) -> Result<RecoveryResult> {
        let mut reader = WalReader::open(path)?;
        let mut result = RecoveryResult::default();

        loop {
            let start = reader.position();
            match reader.next_entry() {
                Ok(Some(entry)) => {
                    // A stale or replayed frame can pass its own CRC; order
                    // is what exposes it.
                    if entry.lsn <= result.last_lsn {
                        tracing::debug!(
                            lsn = entry.lsn,
                            previous = result.last_lsn,
                            "WAL entry out of sequence"
                        );
                        result.entries_corrupted = 1;
                        result.valid_len = start;
                        break;
                    }
                    result.last_lsn = entry.lsn;
                    result.entries_recovered += 1;
                    result.valid_len = reader.position();
                    visit(entry);
                }
                Ok(None) => break,
                Err(CabinetError::WalCorruption(reason)) => {
                    tracing::debug!(%reason, "WAL scan stopped at corrupt entry");
                    result.entries_corrupted = 1;
                    result.valid_len = start;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }
}
