//! Snapshot storage test suite
