//! Pre-built test datasets and fixtures for common testing scenarios.

use crate::collection::Collection;
use crate::value::{Key, OffsetAccess, Object, Value};
use serde::Serialize;

/// A character record, usable both as a plain map (via serde) and as an
/// [`Object`] exposing its fields as properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub age: i64,
}

impl Character {
    fn new(id: i64, name: &str, age: i64) -> Self {
        Self { id, name: name.to_string(), age }
    }
}

impl Object for Character {
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Int(self.id)),
            "name" => Some(Value::from(self.name.as_str())),
            "age" => Some(Value::Int(self.age)),
            _ => None,
        }
    }

    fn export(&self) -> Value {
        serde_json::to_value(self).map(Value::from).unwrap_or_default()
    }
}

/// Sixteen characters with ids `1..=16`. Their ages sum to 337 and average 21.0625.
///
/// # Example
///
/// ```
/// use keyflow::testing::characters;
///
/// let people = characters();
/// assert_eq!(people.len(), 16);
/// assert_eq!(people[7].name, "Arya Stark");
/// ```
#[must_use]
pub fn characters() -> Vec<Character> {
    vec![
        Character::new(1, "Eddard Stark", 34),
        Character::new(2, "Catelyn Stark", 33),
        Character::new(3, "Daenerys Targaryen", 13),
        Character::new(4, "Tyrion Lannister", 24),
        Character::new(5, "Jon Snow", 14),
        Character::new(6, "Brandon Stark", 7),
        Character::new(7, "Sansa Stark", 11),
        Character::new(8, "Arya Stark", 9),
        Character::new(9, "Theon Greyjoy", 18),
        Character::new(10, "Davos Seaworth", 37),
        Character::new(11, "Jaime Lannister", 31),
        Character::new(12, "Samwell Tarly", 14),
        Character::new(13, "Cersei Lannister", 31),
        Character::new(14, "Brienne of Tarth", 17),
        Character::new(15, "Brandon Stark Twin", 7),
        Character::new(16, "Davos Seaworth Twin", 37),
    ]
}

/// [`characters`] as a collection of maps keyed `0..16`.
///
/// # Example
///
/// ```
/// use keyflow::Value;
/// use keyflow::testing::character_maps;
///
/// let ages = character_maps().extract("age");
/// assert_eq!(ages.first().unwrap(), Some(Value::Int(34)));
/// ```
#[must_use]
pub fn character_maps() -> Collection {
    characters().iter().map(Character::export).collect()
}

/// [`characters`] as a collection of [`Object`] values keyed `0..16`.
#[must_use]
pub fn character_objects() -> Collection {
    characters().into_iter().map(Value::object).collect()
}

/// A flight record for grouping scenarios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flight {
    pub origin: String,
    pub dest: String,
    pub date: String,
    pub number: String,
    pub carrier: String,
    pub delay: f64,
    pub cancelled: bool,
}

/// Two flights from BOS to LAX, one of them cancelled.
///
/// Grouped by destination, LAX has a mean delay of 10 over the flights that
/// took off and a cancellation rate of 0.5.
#[must_use]
pub fn flights() -> Vec<Flight> {
    let flight = |date: &str, delay: f64, cancelled: bool| Flight {
        origin: "BOS".to_string(),
        dest: "LAX".to_string(),
        date: date.to_string(),
        number: "25".to_string(),
        carrier: "AA".to_string(),
        delay,
        cancelled,
    };
    vec![flight("2015-01-12", 10.0, false), flight("2015-01-13", 0.0, true)]
}

/// [`flights`] as a collection of maps.
#[must_use]
pub fn flight_maps() -> Collection {
    flights()
        .iter()
        .map(|f| serde_json::to_value(f).map(Value::from).unwrap_or_default())
        .collect()
}

/// A fixed-size container object with offset access, for selector tests.
#[derive(Debug, Clone, Default)]
pub struct Slots {
    pub slots: Vec<Value>,
    pub label: String,
}

impl OffsetAccess for Slots {
    fn offset_exists(&self, key: &Key) -> bool {
        key.as_int()
            .and_then(|i| usize::try_from(i).ok())
            .is_some_and(|i| i < self.slots.len())
    }

    fn offset_get(&self, key: &Key) -> Value {
        key.as_int()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| self.slots.get(i).cloned())
            .unwrap_or_default()
    }
}

impl Object for Slots {
    fn property(&self, name: &str) -> Option<Value> {
        (name == "label").then(|| Value::from(self.label.as_str()))
    }

    fn offsets(&self) -> Option<&dyn OffsetAccess> {
        Some(self)
    }
}
