//! End-to-end pipelines built only from public operations.

use anyhow::Result;
use keyflow::testing::*;
use keyflow::*;
use serde_json::json;

#[test]
fn fibonacci_from_an_infinite_sequence() -> Result<()> {
    let fib = Collection::iterate(vec![1, 1], |pair| {
        let a = pair.get(0).as_i64().unwrap_or(0);
        let b = pair.get(1).as_i64().unwrap_or(0);
        Value::from(vec![b, a + b])
    })
    .map(|pair, _| pair.get(0))
    .take(5)
    .values();

    assert_collection_json(&fib, json!([1, 1, 2, 3, 5]));
    // Walking it again regenerates the sequence from the seed.
    assert_collection_json(&fib, json!([1, 1, 2, 3, 5]));
    Ok(())
}

#[test]
fn average_age_is_the_arithmetic_mean() -> Result<()> {
    let people = character_maps();
    let total: i64 = characters().iter().map(|c| c.age).sum();
    let expected = Value::Float(total as f64 / 16.0);

    assert_eq!(people.avg("age")?, expected);
    assert_eq!(people.avg(Selector::from_fn(|p| p.get("age")))?, expected);
    assert_error_kind(&Collection::new().avg("age"), ErrorKind::EmptyCollection);
    Ok(())
}

#[test]
fn negative_slice_resolves_against_the_count() -> Result<()> {
    let people = character_maps();
    assert_eq!(people.count()?, 16);

    let slice = people.slice(-2, Some(-1));
    assert_keys(&slice, &[Key::Int(14)]);
    assert_eq!(slice.extract("name").first()?, Some(Value::from("Brandon Stark Twin")));
    Ok(())
}

#[test]
fn colliding_index_is_recoverable() -> Result<()> {
    let indexed = Collection::from_json(json!([{"id": 1}, {"id": 1}])).index_by("id");
    assert_error_kind(&indexed.to_array(), ErrorKind::DuplicateKey);
    assert_eq!(indexed.values().count()?, 2);

    let relaxed = indexed.with_strict_unique_keys(false);
    assert_eq!(relaxed.count()?, 2);
    assert_eq!(relaxed.to_array()?.len(), 1);
    Ok(())
}

#[test]
fn concat_overwrites_rekeyed_upstream() -> Result<()> {
    let source = Collection::from_pairs([(0, 1), (1, 3), (2, 3), (3, 2)]).with_strict_unique_keys(false);
    let joined = source.concat(&Collection::from(vec![4, 5]));
    assert_collection_json(&joined, json!([4, 5, 3, 2]));
    assert_eq!(joined.values().count()?, 6);
    Ok(())
}

fn summarize(flights: &Collection) -> Result<Value> {
    let cancelled = |f: &Value, _: &Key| f.get("cancelled").truthy();
    let num_cancellations = flights.filter(cancelled).count()?;
    let total_delay = flights
        .reject(cancelled)
        .reduce(|acc, f, _| acc.add(&f.get("delay")).unwrap_or(acc), 0)?;
    Ok(Value::map([
        ("numFlights", Value::from(flights.count()?)),
        ("numCancellations", Value::from(num_cancellations)),
        ("totalDelay", total_delay),
    ]))
}

fn build_results(airport: &Value) -> Value {
    let flights = airport.get("numFlights").as_f64().unwrap_or(0.0);
    let cancelled = airport.get("numCancellations").as_f64().unwrap_or(0.0);
    let delay = airport.get("totalDelay").as_f64().unwrap_or(0.0);
    Value::map([
        ("meanDelay", Value::Float(delay / (flights - cancelled))),
        ("cancellationRate", Value::Float(cancelled / flights)),
    ])
}

#[test]
fn grouping_flight_records() -> Result<()> {
    let result = flight_maps()
        .group_by("dest")
        .map(|group, _| {
            group
                .as_collection()
                .and_then(|g| summarize(g).ok())
                .unwrap_or_default()
        })
        .map(|airport, _| build_results(airport));

    assert_collection_json(
        &result,
        json!({"LAX": {"meanDelay": 10.0, "cancellationRate": 0.5}}),
    );
    Ok(())
}

#[test]
fn transposing_a_validated_matrix() -> Result<()> {
    let rows = collection_collection(vec![
        Collection::from(vec![1, 2, 3]),
        Collection::from(vec![4, 5, 6]),
    ])?;
    let columns = rows.transpose();
    assert_collection_json(&columns, json!([[1, 4], [2, 5], [3, 6]]));

    let column_sums = columns.map(|col, _| {
        col.as_collection()
            .and_then(|c| c.sum(Selector::None).ok())
            .unwrap_or_default()
    });
    assert_collection_json(&column_sums, json!([5, 7, 9]));
    Ok(())
}

#[test]
fn starks_sorted_by_age() -> Result<()> {
    let house = |c: &Value| {
        let name = c.get("name");
        let surname = name.as_str().and_then(|n| n.split_whitespace().nth(1)).unwrap_or("").to_string();
        Value::from(surname)
    };
    let starks = character_maps()
        .filter(move |c, _| house(c).as_str() == Some("Stark"))
        .sort_by("age")
        .extract("name")
        .values();
    assert_collection_json(
        &starks,
        json!(["Brandon Stark", "Brandon Stark Twin", "Arya Stark", "Sansa Stark", "Catelyn Stark", "Eddard Stark"]),
    );
    Ok(())
}
