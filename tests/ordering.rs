use anyhow::Result;
use keyflow::testing::*;
use keyflow::*;
use serde_json::json;
use std::collections::HashSet;

#[test]
fn sort_uses_natural_order_and_keeps_keys() {
    let c = Collection::from_json(json!([3, "b", 1.5, null, "a", true, 2]));
    assert_collection_json(&c.sort().values(), json!([null, true, 1.5, 2, 3, "a", "b"]));
    assert_keys(&Collection::from(vec![2, 1]).sort(), &[Key::Int(1), Key::Int(0)]);
}

#[test]
fn sort_is_stable_on_ties() {
    let c = Collection::from_json(json!([{"n": 1, "tag": "x"}, {"n": 0, "tag": "y"}, {"n": 1, "tag": "z"}]));
    assert_collection_json(&c.sort_by("n").extract("tag"), json!(["y", "x", "z"]));
}

#[test]
fn sort_with_a_custom_comparator() {
    let c = Collection::from(vec![1, 3, 2]);
    let descending = c.sort_with(|a, b| b.compare(a));
    assert_collection_json(&descending.values(), json!([3, 2, 1]));
}

#[test]
fn sort_by_extracted_values_of_objects() {
    let youngest = character_objects().sort_by("age").take(2).extract("name");
    assert_collection_json(&youngest, json!(["Brandon Stark", "Brandon Stark Twin"]));
}

#[test]
fn sort_by_keys_orders_integers_before_strings() {
    let c = Collection::from_pairs([(Key::from("b"), 1), (Key::Int(2), 2), (Key::from("a"), 3), (Key::Int(1), 4)]);
    assert_keys(&c.sort_by_keys(), &[Key::Int(1), Key::Int(2), Key::from("a"), Key::from("b")]);
}

#[test]
fn shuffle_keeps_every_pair_and_is_stable_across_passes() -> Result<()> {
    let c = sequential_data(1, 50);
    let shuffled = c.shuffle();
    let first = shuffled.to_pairs()?;
    assert_eq!(first.len(), 50);
    assert_eq!(shuffled.to_pairs()?, first);

    let keys: HashSet<Key> = first.into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys.len(), 50);
    Ok(())
}

#[mark_flaky_tests::flaky]
#[test]
fn shuffle_changes_order() {
    let c = sequential_data(1, 50);
    assert_ne!(c.shuffle().to_values().unwrap(), c.to_values().unwrap());
}

#[test]
fn random_picks_distinct_elements_in_original_order() -> Result<()> {
    let c = sequential_data(0, 19);
    let picked = c.random(5);
    let pairs = picked.to_pairs()?;
    assert_eq!(pairs.len(), 5);
    assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
    assert!(pairs.iter().all(|(k, v)| Value::from(k.clone()) == *v));
    assert_eq!(picked.to_pairs()?, pairs);
    Ok(())
}

#[test]
fn random_rejects_impossible_counts() {
    let c = sequential_data(1, 3);
    assert_error_kind(&c.random(0).to_array(), ErrorKind::InvalidArgument);
    assert_error_kind(&c.random(4).to_array(), ErrorKind::InvalidArgument);
    assert_collection_size(&c.random(3), 3);
}
