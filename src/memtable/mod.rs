//! MemTable Module
//!
//! In-memory view of every live record while a session is open.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Track size for diagnostics and compaction decisions
//! - Ordered iteration for snapshot creation and for the store's
//!   native iteration order
//!
//! ## Data Structure Choice
//! Using a plain BTreeMap:
//! - Ordered keys (required for snapshot generation)
//! - A session owns its table exclusively, so no interior locking
//! - The snapshot is loaded in full on open, so deletes remove entries
//!   outright and no tombstones are needed

mod table;

pub use table::{MemTable, MemTableIter};
