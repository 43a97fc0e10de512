//! Tests for iteration and predicate operations
//!
//! These tests verify:
//! - each/each_key/each_value visit records in key order
//! - select and delete_if see (key, value) pairs
//! - shift drains the cabinet

use std::collections::BTreeSet;

use hashcabinet::Value;

use crate::{band, setup_bands, setup_cabinet};

// =============================================================================
// Visitor Tests
// =============================================================================

#[test]
fn test_each_visits_every_record() {
    let (_temp, cabinet) = setup_bands();

    let mut visited = Vec::new();
    cabinet
        .each(|key, value| {
            let name = value.get("name").and_then(Value::as_str).unwrap_or_default();
            visited.push(format!("{}={}", key, name));
        })
        .unwrap();

    assert_eq!(
        visited,
        vec!["iron-maiden=Iron Maiden", "metallica=Metallica", "pantera=Pantera"]
    );
}

#[test]
fn test_each_key_and_each_value() {
    let (_temp, cabinet) = setup_bands();

    let mut keys = Vec::new();
    cabinet.each_key(|key| keys.push(key.to_string())).unwrap();
    assert_eq!(keys, cabinet.keys().unwrap());

    let mut since = Vec::new();
    cabinet
        .each_value(|value| since.push(value.get("active_since").and_then(Value::as_i64)))
        .unwrap();
    assert_eq!(since, vec![Some(1975), Some(1981), Some(1981)]);
}

#[test]
fn test_each_on_empty_cabinet() {
    let (_temp, cabinet) = setup_cabinet();

    let mut calls = 0;
    cabinet.each(|_, _| calls += 1).unwrap();

    assert_eq!(calls, 0);
}

// =============================================================================
// Predicate Tests
// =============================================================================

#[test]
fn test_select_active_bands() {
    let (_temp, cabinet) = setup_bands();

    let active = cabinet
        .select(|_, value| value.get("active_to") == Some(&Value::from("Present")))
        .unwrap();

    assert_eq!(active.len(), 2);
    assert!(active.contains_key("metallica"));
    assert!(active.contains_key("iron-maiden"));
    assert_eq!(active["metallica"], band("Metallica", 1981, "Present"));
}

#[test]
fn test_select_by_key() {
    let (_temp, cabinet) = setup_bands();

    let selected = cabinet.select(|key, _| key.starts_with('p')).unwrap();

    assert_eq!(selected.keys().collect::<Vec<_>>(), vec!["pantera"]);
}

#[test]
fn test_delete_if_removes_matches() {
    let (_temp, cabinet) = setup_cabinet();
    cabinet.set("a", 1).unwrap();
    cabinet.set("b", 2).unwrap();
    cabinet.set("c", 3).unwrap();

    let removed = cabinet
        .delete_if(|_, value| value.as_i64().map_or(false, |n| n > 1))
        .unwrap();

    assert_eq!(removed, 2);
    assert_eq!(cabinet.keys().unwrap(), vec!["a"]);
    assert_eq!(cabinet.get("a").unwrap(), Some(Value::from(1)));
}

#[test]
fn test_delete_if_without_matches() {
    let (_temp, cabinet) = setup_bands();

    let removed = cabinet.delete_if(|_, _| false).unwrap();

    assert_eq!(removed, 0);
    assert_eq!(cabinet.len().unwrap(), 3);
}

// =============================================================================
// Shift Tests
// =============================================================================

#[test]
fn test_shift_drains() {
    let (_temp, cabinet) = setup_bands();

    let mut seen = BTreeSet::new();
    while let Some((key, value)) = cabinet.shift().unwrap() {
        assert!(value.get("name").is_some());
        assert!(seen.insert(key));
    }

    assert_eq!(seen.len(), 3);
    assert_eq!(cabinet.size().unwrap(), 0);
    assert_eq!(cabinet.shift().unwrap(), None);
}

#[test]
fn test_shift_takes_first_key() {
    let (_temp, cabinet) = setup_cabinet();
    cabinet.set("zeta", 26).unwrap();
    cabinet.set("alpha", 1).unwrap();

    assert_eq!(
        cabinet.shift().unwrap(),
        Some(("alpha".to_string(), Value::from(1)))
    );
    assert_eq!(cabinet.keys().unwrap(), vec!["zeta"]);
}
