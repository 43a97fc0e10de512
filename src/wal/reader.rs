//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{CabinetError, Result};

use super::entry::payload_len;
use super::{WalEntry, HEADER_SIZE};

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Offset just past the last entry that decoded cleanly
    position: u64,

    /// File length when opened
    file_len: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            file_len,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file. A frame cut short by a
    /// crash, or one whose checksum fails, is reported as
    /// [`CabinetError::WalCorruption`] and leaves [`position`](Self::position)
    /// at the start of that frame.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let remaining = self.file_len - self.position;
        if remaining == 0 {
            return Ok(None);
        }

        if remaining < HEADER_SIZE as u64 {
            return Err(CabinetError::WalCorruption(format!(
                "partial header at offset {} ({} bytes)",
                self.position, remaining
            )));
        }

        let mut header = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header)?;

        let len = payload_len(&header);
        if (len as u64) > remaining - HEADER_SIZE as u64 {
            return Err(CabinetError::WalCorruption(format!(
                "partial entry at offset {}: needs {} bytes, {} left",
                self.position,
                len,
                remaining - HEADER_SIZE as u64
            )));
        }

        let mut data = vec![0u8; len];
        self.reader.read_exact(&mut data)?;

        let entry = WalEntry::decode(&header, &data).map_err(|e| match e {
            CabinetError::WalCorruption(msg) => {
                CabinetError::WalCorruption(format!("at offset {}: {}", self.position, msg))
            }
            other => other,
        })?;

        self.position += (HEADER_SIZE + len) as u64;
        Ok(Some(entry))
    }

    /// Offset just past the last valid entry read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over all valid entries
    ///
    /// The iterator yields the first corruption error and then stops.
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL entries
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
