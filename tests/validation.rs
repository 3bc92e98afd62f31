use anyhow::Result;
use keyflow::testing::*;
use keyflow::*;
use serde_json::json;

#[test]
fn array_collection_accepts_maps_and_indexable_objects() -> Result<()> {
    let rows = vec![
        Value::from(json!({"id": 1})),
        Value::object(Slots {
            slots: vec![Value::Int(7)],
            label: "slot".into(),
        }),
    ];
    let c = array_collection(rows)?;
    assert_collection_json(&c.extract(0), json!([null, 7]));
    Ok(())
}

#[test]
fn array_collection_rejects_plain_objects_and_scalars() {
    let plain = vec![Value::object(characters()[0].clone())];
    assert_error_kind(&array_collection(plain), ErrorKind::InvalidType);
    assert_error_kind(&array_collection(json!([{"id": 1}, "nope"])), ErrorKind::InvalidType);
}

#[test]
fn collection_collection_accepts_nested_collections() -> Result<()> {
    let c = collection_collection(vec![Collection::from(vec![1, 2]), Collection::from(vec![3])])?;
    assert_collection_json(&c.transpose(), json!([[1, 3], [2, null]]));
    Ok(())
}

#[test]
fn collection_collection_rejects_maps() {
    assert_error_kind(&collection_collection(json!([{"a": 1}])), ErrorKind::InvalidType);
}

#[test]
fn validation_surfaces_upstream_errors() {
    let dupes = PairsBuilder::new()
        .add_pair(0, Value::from(json!({})))
        .add_pair(0, Value::from(json!({})))
        .build_collection();
    assert_error_kind(&array_collection(dupes), ErrorKind::DuplicateKey);
}
