//! Tests for store locking
//!
//! These tests verify:
//! - A nested open on the same thread fails immediately
//! - Another thread waits for the holder, up to the lock timeout
//! - Separate directories do not contend

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use hashcabinet::config::Config;
use hashcabinet::Store;
use tempfile::TempDir;

fn setup_store() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store");
    (temp_dir, path)
}

#[test]
fn test_nested_open_fails_fast() {
    let (_temp, path) = setup_store();
    let config = Config::builder().data_dir(&path).build();

    let outer = Store::open(&config).unwrap();

    let started = Instant::now();
    let err = Store::open(&config).err().unwrap();

    assert!(err.is_storage_unavailable());
    assert!(started.elapsed() < config.lock_timeout);
    drop(outer);

    // Released once the outer session is gone
    assert!(Store::open(&config).is_ok());
}

#[test]
fn test_second_thread_waits_for_holder() {
    let (_temp, path) = setup_store();
    let config = Config::builder().data_dir(&path).build();

    let mut holder = Store::open(&config).unwrap();
    holder.put(b"from", b"holder").unwrap();

    let (opened_tx, opened_rx) = mpsc::channel();
    let waiter = {
        let config = config.clone();
        thread::spawn(move || {
            let mut session = Store::open(&config).unwrap();
            opened_tx.send(()).unwrap();
            let seen = session.get(b"from").map(<[u8]>::to_vec);
            session.put(b"from", b"waiter").unwrap();
            session.close().unwrap();
            seen
        })
    };

    // The waiter cannot get in while we hold the store
    assert!(opened_rx.recv_timeout(Duration::from_millis(200)).is_err());
    holder.close().unwrap();

    let seen = waiter.join().unwrap();
    assert_eq!(seen, Some(b"holder".to_vec()));

    let session = Store::open(&config).unwrap();
    assert_eq!(session.get(b"from"), Some(&b"waiter"[..]));
}

#[test]
fn test_waiter_times_out() {
    let (_temp, path) = setup_store();
    let config = Config::builder()
        .data_dir(&path)
        .lock_timeout(Duration::from_millis(50))
        .build();

    let _holder = Store::open(&config).unwrap();

    let waiter = {
        let config = config.clone();
        thread::spawn(move || Store::open(&config).err())
    };

    let err = waiter.join().unwrap().unwrap();
    assert!(err.is_storage_unavailable());
}

#[test]
fn test_distinct_directories_do_not_contend() {
    let temp_dir = TempDir::new().unwrap();
    let first = Config::builder().data_dir(temp_dir.path().join("one")).build();
    let second = Config::builder().data_dir(temp_dir.path().join("two")).build();

    let a = Store::open(&first).unwrap();
    let b = Store::open(&second).unwrap();

    a.close().unwrap();
    b.close().unwrap();
}
