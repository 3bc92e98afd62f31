//! Assertion functions for testing collection outputs.
//!
//! Every assertion realizes the collection it is given, so a collection that
//! fails to realize makes the assertion panic with the underlying error.

use crate::collection::Collection;
use crate::error::ErrorKind;
use crate::value::{Key, Value};
use std::fmt::Debug;

fn realized_json(collection: &Collection) -> serde_json::Value {
    match collection.to_json() {
        Ok(json) => json,
        Err(e) => panic!("Collection failed to realize: {e:#}"),
    }
}

fn realized_values(collection: &Collection) -> Vec<Value> {
    match collection.to_values() {
        Ok(values) => values,
        Err(e) => panic!("Collection failed to realize its values: {e:#}"),
    }
}

/// Assert that a collection realizes to exactly `expected`, keys included.
///
/// Keys `0..n` in order realize to a JSON array, anything else to an object.
///
/// # Panics
///
/// Panics if realization fails or the documents differ.
///
/// # Example
///
/// ```
/// use keyflow::Collection;
/// use keyflow::testing::assert_collection_json;
/// use serde_json::json;
///
/// assert_collection_json(&Collection::from_pairs([("a", 1)]), json!({"a": 1}));
/// ```
pub fn assert_collection_json(actual: &Collection, expected: serde_json::Value) {
    let actual = realized_json(actual);
    assert_eq!(
        actual, expected,
        "Collection mismatch:\n  Expected: {expected}\n  Actual: {actual}"
    );
}

/// Assert that the values of a collection, in order, equal the `expected` JSON array.
///
/// Keys are never requested, so repeated keys do not make this fail.
///
/// # Panics
///
/// Panics if realization fails or the values differ.
pub fn assert_values_json(actual: &Collection, expected: serde_json::Value) {
    let values = realized_values(actual);
    let actual = match Value::list(values).to_json() {
        Ok(json) => json,
        Err(e) => panic!("Collection values are not JSON-representable: {e:#}"),
    };
    assert_eq!(
        actual, expected,
        "Collection values mismatch:\n  Expected: {expected}\n  Actual: {actual}"
    );
}

/// Assert the key sequence of one pass.
///
/// # Panics
///
/// Panics if realization fails or the keys differ.
///
/// # Example
///
/// ```
/// use keyflow::{Collection, Key};
/// use keyflow::testing::assert_keys;
///
/// let c = Collection::from_pairs([("b", 1), ("a", 2)]);
/// assert_keys(&c, &[Key::from("b"), Key::from("a")]);
/// ```
pub fn assert_keys(actual: &Collection, expected: &[Key]) {
    let keys: Vec<Key> = match actual.to_pairs() {
        Ok(pairs) => pairs.into_iter().map(|(k, _)| k).collect(),
        Err(e) => panic!("Collection failed to realize its keys: {e:#}"),
    };
    assert_eq!(
        keys.len(),
        expected.len(),
        "Key count mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {keys:?}",
        expected.len(),
        keys.len()
    );
    for (i, (a, e)) in keys.iter().zip(expected).enumerate() {
        assert_eq!(a, e, "Key mismatch at position {i}:\n  Expected: {e}\n  Actual: {a}");
    }
}

/// Assert that `result` failed with a [`CollectionError`](crate::CollectionError) of kind `expected`.
///
/// # Panics
///
/// Panics if `result` is `Ok` or carries another kind of error.
///
/// # Example
///
/// ```
/// use keyflow::*;
/// use keyflow::testing::assert_error_kind;
///
/// let empty = Collection::new();
/// assert_error_kind(&empty.avg(Selector::None), ErrorKind::EmptyCollection);
/// ```
pub fn assert_error_kind<T: Debug>(result: &anyhow::Result<T>, expected: ErrorKind) {
    match result {
        Ok(value) => panic!("Expected a {expected:?} error, got Ok({value:?})"),
        Err(e) => assert_eq!(
            ErrorKind::of(e),
            Some(expected),
            "Error kind mismatch:\n  Expected: {expected:?}\n  Actual error: {e:#}"
        ),
    }
}

/// Assert the number of elements, counted values-only.
///
/// # Panics
///
/// Panics if realization fails or the size differs.
pub fn assert_collection_size(collection: &Collection, expected_size: usize) {
    let values = realized_values(collection);
    assert_eq!(
        values.len(),
        expected_size,
        "Collection size mismatch:\n  Expected: {expected_size}\n  Actual: {}\n  Values: {values:?}",
        values.len()
    );
}

/// Assert that every value satisfies `predicate`.
///
/// # Panics
///
/// Panics if realization fails or any value fails the predicate.
pub fn assert_all(collection: &Collection, predicate: impl Fn(&Value) -> bool) {
    let values = realized_values(collection);
    for (i, v) in values.iter().enumerate() {
        assert!(predicate(v), "Predicate failed for value at position {i}: {v:?}");
    }
}
