//! Tests for WAL Writer
//!
//! These tests verify:
//! - Writing entries to WAL
//! - LSN generation and sequencing, including across reopen
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - Truncation
//! - Refusing to append after a torn tail
//! - Refusing further use after a failed write

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use hashcabinet::config::WalSyncStrategy;
use hashcabinet::wal::{Operation, WalReader, WalWriter};
use hashcabinet::CabinetError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn put(key: &str, value: &str) -> Operation {
    Operation::Put {
        key: key.as_bytes().to_vec(),
        value: value.as_bytes().to_vec(),
    }
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_write_single_entry() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    let lsn = writer.append(put("key1", "value1")).unwrap();

    assert_eq!(lsn, 1);
    assert_eq!(writer.current_lsn(), 2);
    assert_eq!(writer.entry_count(), 1);
}

#[test]
fn test_lsn_sequential() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    for expected in 1..=10 {
        let lsn = writer.append(put("k", "v")).unwrap();
        assert_eq!(lsn, expected);
    }
}

#[test]
fn test_reopen_continues_lsn() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(put("a", "1")).unwrap();
        writer.append(put("b", "2")).unwrap();
        writer.append(Operation::Clear).unwrap();
    }

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 4);
    assert_eq!(writer.entry_count(), 3);
    assert_eq!(writer.append(put("c", "3")).unwrap(), 4);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_sync_every_write() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append(put("k", "v")).unwrap();

    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_sync_every_n_entries() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 3 }).unwrap();

    writer.append(put("k1", "v1")).unwrap();
    assert_eq!(writer.uncommitted_count(), 1);
    writer.append(put("k2", "v2")).unwrap();
    assert_eq!(writer.uncommitted_count(), 2);

    // Third write reaches the threshold
    writer.append(put("k3", "v3")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_manual_sync() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 100 }).unwrap();
    writer.append(put("k1", "v1")).unwrap();
    writer.append(put("k2", "v2")).unwrap();
    assert_eq!(writer.uncommitted_count(), 2);

    writer.sync().unwrap();
    assert_eq!(writer.uncommitted_count(), 0);

    let reader = WalReader::open(&wal_path).unwrap();
    assert_eq!(reader.entries().count(), 2);
}

// =============================================================================
// Write-Then-Read Tests
// =============================================================================

#[test]
fn test_write_then_read() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(put("key1", "value1")).unwrap();
        writer.append(Operation::Delete { key: b"key1".to_vec() }).unwrap();
    }

    let mut reader = WalReader::open(&wal_path).unwrap();

    let first = reader.next_entry().unwrap().unwrap();
    assert_eq!(first.lsn, 1);
    assert_eq!(first.operation, put("key1", "value1"));

    let second = reader.next_entry().unwrap().unwrap();
    assert_eq!(second.lsn, 2);
    assert_eq!(second.operation, Operation::Delete { key: b"key1".to_vec() });

    assert!(reader.next_entry().unwrap().is_none());
}

// =============================================================================
// Truncation Tests
// =============================================================================

#[test]
fn test_truncate_resets_lsn() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    for _ in 0..5 {
        writer.append(put("k", "v")).unwrap();
    }
    assert_eq!(writer.current_lsn(), 6);

    writer.truncate().unwrap();
    assert_eq!(writer.current_lsn(), 1);
    assert_eq!(writer.entry_count(), 0);
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), 0);
}

#[test]
fn test_truncate_then_write() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append(put("old", "data")).unwrap();
    writer.truncate().unwrap();
    writer.append(put("new", "data")).unwrap();

    let reader = WalReader::open(&wal_path).unwrap();
    let entries: Vec<_> = reader.entries().map(|r| r.unwrap()).collect();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].lsn, 1);
    assert_eq!(entries[0].operation, put("new", "data"));
}

// =============================================================================
// Torn Tail Tests
// =============================================================================

#[test]
fn test_open_refuses_torn_tail() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(put("k", "v")).unwrap();
    }

    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[0x01, 0x02, 0x03]).unwrap();
    file.sync_all().unwrap();

    let result = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite);
    assert!(matches!(result, Err(CabinetError::WalCorruption(_))));
}

// =============================================================================
// Failed Write Tests
// =============================================================================

// /dev/full accepts opens and fails every write with ENOSPC
#[cfg(target_os = "linux")]
fn full_device_writer(strategy: WalSyncStrategy) -> WalWriter {
    WalWriter::resume(
        std::path::Path::new("/dev/full"),
        strategy,
        &hashcabinet::wal::RecoveryResult::default(),
    )
    .unwrap()
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_write_poisons_writer() {
    let mut writer = full_device_writer(WalSyncStrategy::EveryNEntries { count: 100 });

    // Larger than the write buffer, so it goes straight to the device
    let big = Operation::Put {
        key: b"big".to_vec(),
        value: vec![0xAB; 64 * 1024],
    };
    assert!(matches!(writer.append(big), Err(CabinetError::Io(_))));
    assert!(writer.is_poisoned());

    assert!(matches!(
        writer.append(put("k", "v")),
        Err(CabinetError::WalCorruption(_))
    ));
    assert!(matches!(writer.sync(), Err(CabinetError::WalCorruption(_))));
    assert!(matches!(writer.truncate(), Err(CabinetError::WalCorruption(_))));
    assert_eq!(writer.current_lsn(), 1);
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_flush_poisons_writer() {
    let mut writer = full_device_writer(WalSyncStrategy::EveryWrite);

    assert!(matches!(writer.append(put("k", "v")), Err(CabinetError::Io(_))));
    assert!(writer.is_poisoned());
    assert!(matches!(
        writer.append(put("k2", "v2")),
        Err(CabinetError::WalCorruption(_))
    ));
}

#[test]
fn test_healthy_writer_is_not_poisoned() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    writer.append(put("k", "v")).unwrap();
    writer.sync().unwrap();

    assert!(!writer.is_poisoned());
}
