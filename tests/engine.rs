//! Iteration protocol, input normalization and multi-pass behavior.

use anyhow::Result;
use keyflow::testing::*;
use keyflow::*;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn fixed_input_round_trips() -> Result<()> {
    let input = json!({"a": 1, "b": [1, 2], "c": {"d": null}});
    let c = Collection::from_json(input.clone());
    assert_eq!(c.to_json()?, input);
    Ok(())
}

#[test]
fn protocol_before_restart_is_at_end() -> Result<()> {
    let mut c = Collection::from(vec![1]);
    assert!(c.at_end());
    assert_eq!(c.value(), None);
    assert_eq!(c.key()?, None);
    Ok(())
}

#[test]
fn derived_collections_can_be_walked_repeatedly() -> Result<()> {
    let evens = Collection::from(vec![1, 2, 3, 4]).filter(|v, _| v.as_i64().is_some_and(|n| n % 2 == 0));
    assert_eq!(evens.to_json()?, json!({"1": 2, "3": 4}));
    assert_eq!(evens.to_json()?, json!({"1": 2, "3": 4}));
    assert_eq!(evens.count()?, 2);
    Ok(())
}

#[test]
fn factory_is_reinvoked_only_for_new_passes() -> Result<()> {
    let (factory, calls) = counting_factory(vec![1, 2, 3]);
    let mut c = Collection::from_factory(factory)?;
    assert_eq!(calls.get(), 1);

    // The sequence produced at construction has not been pulled yet.
    c.restart()?;
    assert_eq!(calls.get(), 1);
    while !c.at_end() {
        c.advance()?;
    }

    c.restart()?;
    assert_eq!(calls.get(), 2);
    assert_eq!(c.value(), Some(&Value::Int(1)));
    Ok(())
}

#[test]
fn first_realization_uses_the_sequence_built_at_construction() -> Result<()> {
    let (factory, calls) = counting_factory(vec![1, 2, 3]);
    let c = Collection::from_factory(factory)?;
    assert_eq!(calls.get(), 1);

    assert_eq!(c.to_values()?, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert_eq!(calls.get(), 1);
    assert_eq!(c.count()?, 3);
    assert_eq!(calls.get(), 2);
    assert_eq!(c.count()?, 3);
    assert_eq!(calls.get(), 2);
    Ok(())
}

#[test]
fn generator_without_factory_supports_one_pass() {
    let c = TestDataBuilder::<i64>::new().add_range(1..=3).build_one_shot();
    assert_values_json(&c, json!([1, 2, 3]));
    assert_error_kind(&c.to_values(), ErrorKind::SequenceConsumed);
}

#[test]
fn stages_over_a_one_shot_source_fail_on_the_second_pass() {
    let c = Collection::from_generator(vec![("a", 1)]).map(|v, _| v.clone());
    assert!(c.to_array().is_ok());
    assert_error_kind(&c.to_array(), ErrorKind::SequenceConsumed);
}

#[test]
fn scalar_inputs_are_rejected() {
    assert_error_kind(&Collection::try_new(Value::Int(3)), ErrorKind::InvalidArgument);
    assert_error_kind(&Collection::from_factory(|| Value::from("x")), ErrorKind::InvalidReturnValue);
}

#[test]
fn factories_may_return_collections_or_maps() -> Result<()> {
    let from_collection = Collection::from_factory(|| Collection::from(vec![1, 2]))?;
    assert_eq!(from_collection.to_json()?, json!([1, 2]));

    let from_map = Collection::from_factory(|| Value::from(json!({"x": 1})))?;
    assert_eq!(from_map.to_json()?, json!({"x": 1}));
    Ok(())
}

#[test]
fn duplicate_key_is_raised_on_its_second_occurrence() -> Result<()> {
    let c = PairsBuilder::new()
        .add_pair("a", 1)
        .add_pair("b", 2)
        .add_pair("a", 3)
        .build_collection();

    let mut seen = Vec::new();
    let mut failure = None;
    for item in c.iter() {
        match item {
            Ok((k, _)) => seen.push(k),
            Err(e) => failure = Some(e),
        }
    }
    assert_eq!(seen, vec![Key::from("a"), Key::from("b")]);
    assert_eq!(failure.as_ref().and_then(ErrorKind::of), Some(ErrorKind::DuplicateKey));

    assert_collection_json(&c.values(), json!([1, 2, 3]));
    Ok(())
}

#[test]
fn strict_keys_toggle_in_place() -> Result<()> {
    let mut c = Collection::from_json(json!([{"id": 1}, {"id": 1}])).index_by("id");
    assert_error_kind(&c.to_array(), ErrorKind::DuplicateKey);

    c.strict_unique_keys(false);
    assert!(!c.is_strict_unique_keys());
    assert_eq!(c.to_json()?, json!({"1": {"id": 1}}));
    Ok(())
}

#[test]
fn derived_collections_inherit_strictness() -> Result<()> {
    let relaxed = Collection::from_pairs([(0, "a"), (0, "b")]).with_strict_unique_keys(false);
    let upper = relaxed.map(|v, _| Value::from(v.as_str().unwrap_or_default().to_uppercase()));
    assert!(!upper.is_strict_unique_keys());
    assert_eq!(upper.to_json()?, json!(["B"]));
    Ok(())
}

#[test]
fn wrapping_a_collection_reads_through_its_own_cursor() -> Result<()> {
    let inner = Collection::from_json(json!({"x": 1, "y": 2}));
    let outer = Collection::try_new(inner.clone())?.map(|v, _| Value::from(v.as_i64().unwrap_or(0) * 10));
    assert_eq!(outer.to_json()?, json!({"x": 10, "y": 20}));
    assert_eq!(inner.to_json()?, json!({"x": 1, "y": 2}));
    Ok(())
}

#[test]
fn infinite_sequences_are_pulled_only_as_far_as_needed() -> Result<()> {
    let pulled = Rc::new(Cell::new(0));
    let counter = Rc::clone(&pulled);
    let naturals = Collection::iterate(0, |v| Value::from(v.as_i64().unwrap_or(0) + 1))
        .each(move |_, _| counter.set(counter.get() + 1));

    assert_eq!(naturals.take(3).to_json()?, json!([0, 1, 2]));
    assert_eq!(pulled.get(), 3);
    Ok(())
}

#[test]
fn indexed_constructor_rekeys_immediately() -> Result<()> {
    let c = Collection::indexed(json!([{"id": "x"}, {"id": "y"}]), "id")?;
    assert_keys(&c, &[Key::from("x"), Key::from("y")]);
    Ok(())
}

#[test]
fn collections_serialize_through_serde() -> Result<()> {
    let nested = Collection::from_pairs([("row", Value::from(Collection::from(vec![1, 2])))]);
    assert_eq!(serde_json::to_string(&nested)?, r#"{"row":[1,2]}"#);
    Ok(())
}

#[test]
fn realization_failures_surface_through_serde() {
    let broken = Collection::from_pairs([(1, "a"), (1, "b")]);
    assert!(serde_json::to_string(&broken).is_err());
}
