//! Tests for session discipline
//!
//! These tests verify:
//! - Nothing is opened until the first operation
//! - Data outlives the Cabinet value that wrote it
//! - Every call releases the store, including failing ones
//! - Reentrant calls fail instead of deadlocking
//! - Foreign bytes at a key are a decode failure

use std::thread;

use hashcabinet::{Cabinet, CabinetError, Config, Value};
use tempfile::TempDir;

use crate::{band, setup_bands, setup_cabinet};

#[test]
fn test_new_opens_nothing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("lazy");

    let cabinet: Cabinet = Cabinet::new(&path);
    assert!(!path.exists());
    assert_eq!(cabinet.path(), path.as_path());

    assert!(cabinet.is_empty().unwrap());
    assert!(path.is_dir());
}

#[test]
fn test_persists_across_instances() {
    let (temp, cabinet) = setup_bands();
    let path = cabinet.path().to_path_buf();
    drop(cabinet);

    let reopened: Cabinet = Cabinet::new(&path);
    assert_eq!(reopened.len().unwrap(), 3);
    assert_eq!(
        reopened.get("pantera").unwrap(),
        Some(band("Pantera", 1981, "2003"))
    );
    drop(temp);
}

#[test]
fn test_typed_cabinet() {
    let temp = TempDir::new().unwrap();
    let cabinet: Cabinet<Vec<u32>> = Cabinet::new(temp.path().join("typed"));

    cabinet.set("primes", vec![2u32, 3, 5, 7]).unwrap();

    assert_eq!(cabinet.get("primes").unwrap(), Some(vec![2, 3, 5, 7]));
    assert!(cabinet.has_value(&vec![2, 3, 5, 7]).unwrap());
}

#[test]
fn test_with_session_releases_after_error() {
    let (_temp, cabinet) = setup_cabinet();

    let result: hashcabinet::Result<()> = cabinet.with_session(|session| {
        session.put(b"written", b"garbage")?;
        Err(CabinetError::Storage("caller gave up".to_string()))
    });
    assert!(matches!(result, Err(CabinetError::Storage(_))));

    // The store is free again and the write was kept
    assert!(cabinet.has_key("written").unwrap());
}

#[test]
fn test_foreign_bytes_are_a_decode_failure() {
    let (_temp, cabinet) = setup_cabinet();
    cabinet
        .with_session(|session| session.put(b"foreign", b"not codec bytes"))
        .unwrap();

    let err = cabinet.get("foreign").unwrap_err();
    assert!(matches!(err, CabinetError::Deserialization(_)));
    assert!(err.is_encoding_failure());

    // Key-only operations do not decode values
    assert!(cabinet.has_key("foreign").unwrap());
    assert_eq!(cabinet.keys().unwrap(), vec!["foreign"]);

    // A failed shift leaves the record in place
    assert!(cabinet.shift().is_err());
    assert_eq!(cabinet.len().unwrap(), 1);
}

#[test]
fn test_reentrant_call_fails_fast() {
    let (_temp, cabinet) = setup_bands();

    let mut inner_errors = Vec::new();
    cabinet
        .each_key(|key| {
            if let Err(e) = cabinet.get(key) {
                inner_errors.push(e);
            }
        })
        .unwrap();

    assert_eq!(inner_errors.len(), 3);
    assert!(inner_errors.iter().all(CabinetError::is_storage_unavailable));
}

#[test]
fn test_threads_share_one_cabinet() {
    let (_temp, cabinet) = setup_cabinet();

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let cabinet = cabinet.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    cabinet.set(format!("t{}-{}", t, i), i).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(cabinet.len().unwrap(), 40);
    assert_eq!(cabinet.get("t3-9").unwrap(), Some(Value::from(9)));
}

#[test]
fn test_unavailable_store() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path().join("missing"))
        .create_if_missing(false)
        .build();
    let cabinet: Cabinet = Cabinet::from_config(config);

    let err = cabinet.get("anything").unwrap_err();
    assert!(err.is_storage_unavailable());
    assert!(!err.is_encoding_failure());
}

#[test]
fn test_cabinet_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Cabinet>();
    assert_send_sync::<Cabinet<String>>();
}
