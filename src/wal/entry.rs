//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{CabinetError, Result};

/// Frame header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },

    /// Drop every record, including those in the snapshot
    Clear,
}

/// Frame body as written; the LSN travels in the header
#[derive(Serialize)]
struct PayloadRef<'a> {
    operation: &'a Operation,
    timestamp: u64,
}

#[derive(Deserialize)]
struct Payload {
    operation: Operation,
    timestamp: u64,
}

impl WalEntry {
    /// Create an entry stamped with the current wall-clock time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Encode the entry as a complete frame (header + data)
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(&PayloadRef {
            operation: &self.operation,
            timestamp: self.timestamp,
        })
        .map_err(|e| CabinetError::Serialization(format!("WAL entry: {}", e)))?;

        let len = u32::try_from(data.len()).map_err(|_| {
            CabinetError::Storage(format!("WAL entry too large: {} bytes", data.len()))
        })?;

        let lsn_bytes = self.lsn.to_le_bytes();
        let len_bytes = len.to_le_bytes();
        let crc = compute_crc(&lsn_bytes, &len_bytes, &data);

        let mut frame = Vec::with_capacity(HEADER_SIZE + data.len());
        frame.extend_from_slice(&lsn_bytes);
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&len_bytes);
        frame.extend_from_slice(&data);
        Ok(frame)
    }

    /// Decode a complete frame, verifying its checksum
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CabinetError::WalCorruption(format!(
                "truncated header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&bytes[..HEADER_SIZE]);
        let len = payload_len(&header);

        let end = HEADER_SIZE + len;
        if bytes.len() < end {
            return Err(CabinetError::WalCorruption(format!(
                "truncated payload: expected {} bytes, got {}",
                len,
                bytes.len() - HEADER_SIZE
            )));
        }

        Self::decode(&header, &bytes[HEADER_SIZE..end])
    }

    /// Decode a frame already split into header and payload
    pub(super) fn decode(header: &[u8; HEADER_SIZE], data: &[u8]) -> Result<Self> {
        let mut lsn_bytes = [0u8; 8];
        lsn_bytes.copy_from_slice(&header[0..8]);
        let stored_crc = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
        let len_bytes = [header[12], header[13], header[14], header[15]];

        let actual_crc = compute_crc(&lsn_bytes, &len_bytes, data);
        if actual_crc != stored_crc {
            return Err(CabinetError::WalCorruption(format!(
                "CRC mismatch: stored {:#010x}, computed {:#010x}",
                stored_crc, actual_crc
            )));
        }

        let payload: Payload = bincode::deserialize(data)
            .map_err(|e| CabinetError::WalCorruption(format!("undecodable entry: {}", e)))?;

        Ok(Self {
            lsn: u64::from_le_bytes(lsn_bytes),
            operation: payload.operation,
            timestamp: payload.timestamp,
        })
    }
}

/// Length of the data section announced by a frame header
pub(super) fn payload_len(header: &[u8; HEADER_SIZE]) -> usize {
    u32::from_le_bytes([header[12], header[13], header[14], header[15]]) as usize
}

fn compute_crc(lsn: &[u8; 8], len: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(lsn);
    hasher.update(len);
    hasher.update(data);
    hasher.finalize()
}
