//! # hashcabinet
//!
//! A persistent, hashmap-shaped key-value store:
//! - Structured values (not just strings) via a compact binary codec
//! - Keys normalized to their string form
//! - Iteration, predicate select/delete, bulk replace/update
//! - Write-Ahead Logging (WAL) with crash recovery underneath
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Cabinet                             │
//! │        (one session per call, keys + values encoded)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Store / Session                          │
//! │          (directory lock, open, replay, close)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │ (BTreeMap)  │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ compaction
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  Snapshot   │
//!                           │  (SSTable)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod codec;
pub mod pair_source;
pub mod cabinet;

pub mod store;
pub mod wal;
pub mod memtable;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CabinetError, Result};
pub use config::{Config, WalSyncStrategy};
pub use value::Value;
pub use pair_source::PairSource;
pub use cabinet::Cabinet;
pub use store::{Session, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of hashcabinet
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
