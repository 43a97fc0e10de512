//! Storage Module
//!
//! Persistent snapshot layer using an SSTable-like format.
//!
//! ## Responsibilities
//! - Persist every live record to disk in sorted format
//! - Load a snapshot back into a MemTable on session open
//! - Replace the snapshot atomically during compaction
//!
//! ## File Format (V1 - Simple)
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header                                 │
//! │ ┌──────────┬──────────┬──────────────┐ │
//! │ │Magic (4) │Version(2)│ Entry Count  │ │
//! │ └──────────┴──────────┴──────────────┘ │
//! ├────────────────────────────────────────┤
//! │ Data Block                             │
//! │ ┌────────┬────────┬─────┬───────────┐ │
//! │ │KeyLen  │ValLen  │ Key │   Value   │ │
//! │ └────────┴────────┴─────┴───────────┘ │
//! │ ... (repeated for each entry)         │
//! ├────────────────────────────────────────┤
//! │ Index Block                            │
//! ├────────────────────────────────────────┤
//! │ Footer                                 │
//! │ ┌──────────────────┬─────────────────┐ │
//! │ │ Index Offset     │    CRC32        │ │
//! │ └──────────────────┴─────────────────┘ │
//! └────────────────────────────────────────┘
//! ```

mod sstable;
mod snapshot;

pub use sstable::{SSTable, SSTableBuilder, SSTableIterator, SSTableReader};
pub use snapshot::{load_snapshot, write_snapshot};
