//! Integration tests demonstrating the testing utilities.

use anyhow::Result;
use keyflow::testing::*;
use keyflow::*;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_builder_produces_collections() -> Result<()> {
    let builder = TestDataBuilder::<i64>::new().add_range(1..=3).add_value(10).add_repeated(0, 2);
    assert_eq!(builder.len(), 6);
    assert!(!builder.is_empty());

    let c = builder.build_collection();
    assert_values_json(&c, json!([1, 2, 3, 10, 0, 0]));
    assert_collection_size(&c, 6);
    Ok(())
}

#[test]
fn test_pairs_builder_keeps_repeated_keys() {
    let pairs = PairsBuilder::new().add_pairs([("a", 1), ("a", 2)]).build();
    assert_eq!(pairs.len(), 2);
}

#[test]
fn test_assert_all() {
    assert_all(&sequential_data(1, 10), |v| v.as_i64().is_some_and(|n| n > 0));
}

#[test]
#[should_panic(expected = "Collection mismatch")]
fn test_collection_json_mismatch_panics() {
    assert_collection_json(&Collection::from(vec![1]), json!([2]));
}

#[test]
#[should_panic(expected = "Key mismatch at position 0")]
fn test_key_mismatch_panics() {
    assert_keys(&Collection::from(vec![1]), &[Key::from("a")]);
}

#[test]
#[should_panic(expected = "Expected a DuplicateKey error")]
fn test_error_kind_on_success_panics() {
    assert_error_kind(&Collection::from(vec![1]).to_array(), ErrorKind::DuplicateKey);
}

#[test]
fn test_debug_stages_pass_values_through() -> Result<()> {
    let seen = Rc::new(Cell::new(0));
    let counter = Rc::clone(&seen);
    let c = sequential_data(1, 4)
        .debug_inspect("source")
        .debug_inspect_with("custom", move |_, _| counter.set(counter.get() + 1))
        .debug_count("end");
    assert_values_json(&c, json!([1, 2, 3, 4]));
    assert_eq!(seen.get(), 4);
    Ok(())
}

#[test]
fn test_fixtures_are_consistent() -> Result<()> {
    assert_eq!(characters().len(), 16);
    assert_eq!(character_maps().count()?, 16);
    assert_eq!(character_objects().extract("name").to_values()?, character_maps().extract("name").to_values()?);
    assert_eq!(flights().len(), 2);
    assert_collection_size(&flight_maps(), 2);
    Ok(())
}
