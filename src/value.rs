//! Keys and dynamically-shaped values carried by a [`Collection`].
//!
//! A collection is a sequence of `(Key, Value)` pairs:
//! - [`Key`] is always scalar: an integer or a string. Anything else that ends
//!   up in key position is coerced with [`Key::from_value`].
//! - [`Value`] is an arbitrary inner value. It can be a scalar, a raw ordered
//!   mapping ([`Map`]), a user object exposing properties ([`Object`]), or a
//!   nested [`Collection`], which is what makes `flatten`, `group_by` and
//!   `transpose` possible.
//!
//! Values use `Rc` internally; collections are single-threaded by design.

use crate::collection::Collection;
use crate::error::CollectionError;
use crate::utils::natural_cmp;
use anyhow::Result;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Ordered key/value mapping with "last write wins, first position kept" semantics.
pub type Map = IndexMap<Key, Value>;

/// A scalar key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Coerce an arbitrary value into key position.
    ///
    /// Integers and strings are kept, booleans become `0`/`1`, `Null` becomes
    /// the empty string, and every other value is converted to its string form.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Int(i) => Self::Int(*i),
            Value::Str(s) => Self::Str(s.clone()),
            Value::Bool(b) => Self::Int(i64::from(*b)),
            Value::Null => Self::Str(String::new()),
            other => Self::Str(other.to_string()),
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Str(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    pub(crate) fn property_name(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<usize> for Key {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Str(s) => serializer.serialize_str(s),
        }
    }
}

/// Offset-style access (`value[key]`) for container-like objects.
pub trait OffsetAccess {
    fn offset_exists(&self, key: &Key) -> bool;
    fn offset_get(&self, key: &Key) -> Value;
}

/// A user object that selectors can read properties from.
///
/// `property` covers both plain fields and accessor-style computed
/// properties. Objects that also behave like containers expose
/// [`OffsetAccess`] through `offsets`, which selectors consult first.
///
/// ```
/// use keyflow::{Object, Value};
///
/// #[derive(Debug)]
/// struct Person { name: String }
///
/// impl Object for Person {
///     fn property(&self, name: &str) -> Option<Value> {
///         (name == "name").then(|| Value::from(self.name.as_str()))
///     }
/// }
///
/// let v = Value::object(Person { name: "Arya".into() });
/// assert!(matches!(v, Value::Object(_)));
/// ```
pub trait Object: fmt::Debug {
    /// Look up a property by name. `None` means the object has no such property.
    fn property(&self, name: &str) -> Option<Value>;

    fn offsets(&self) -> Option<&dyn OffsetAccess> {
        None
    }

    /// Serialized form of the object.
    fn export(&self) -> Value {
        Value::Null
    }
}

/// A dynamically-shaped inner value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Map(Rc<Map>),
    Object(Rc<dyn Object>),
    Collection(Collection),
}

#[derive(Clone, Copy, Debug)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    #[allow(clippy::cast_precision_loss)]
    const fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::Int(i),
            Self::Float(f) => Value::Float(f),
        }
    }
}

impl Value {
    /// Build a [`Value::Map`] from key/value pairs.
    pub fn map<K, V, I>(pairs: I) -> Self
    where
        K: Into<Key>,
        V: Into<Self>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(Rc::new(
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }

    /// Build a list-shaped [`Value::Map`] keyed `0..n`.
    pub fn list<V, I>(values: I) -> Self
    where
        V: Into<Self>,
        I: IntoIterator<Item = V>,
    {
        Self::Map(Rc::new(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::from(i), v.into()))
                .collect(),
        ))
    }

    pub fn object<O: Object + 'static>(object: O) -> Self {
        Self::Object(Rc::new(object))
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Bool, Int, Float and Str are scalar; `Null` is not.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_))
    }

    /// Truthiness used by [`filter_truthy`](crate::Collection::filter_truthy).
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty() && s != "0",
            Self::Map(m) => !m.is_empty(),
            Self::Object(_) | Self::Collection(_) => true,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of Int and Float values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Field of a map-shaped value, `Null` when absent. Mostly for tests and closures.
    #[must_use]
    pub fn get<K: Into<Key>>(&self, key: K) -> Self {
        self.as_map()
            .and_then(|m| m.get(&key.into()).cloned())
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
            Self::Collection(_) => "collection",
        }
    }

    /// Strict (`===`-style) equality.
    ///
    /// Scalars must share a variant and payload, maps must hold the same keys in
    /// the same order with strictly equal values, and objects and collections
    /// compare by identity.
    #[must_use]
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => {
                Rc::ptr_eq(a, b)
                    || (a.len() == b.len()
                        && a.iter()
                            .zip(b.iter())
                            .all(|((ka, va), (kb, vb))| ka == kb && va.strict_eq(vb)))
            }
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Collection(a), Self::Collection(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Natural ordering used by `sort`, `min` and `max`.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        natural_cmp(self, other)
    }

    fn number(&self) -> Result<Number> {
        match self {
            Self::Null => Ok(Number::Int(0)),
            Self::Bool(b) => Ok(Number::Int(i64::from(*b))),
            Self::Int(i) => Ok(Number::Int(*i)),
            Self::Float(f) => Ok(Number::Float(*f)),
            Self::Str(s) => {
                let t = s.trim();
                t.parse::<i64>()
                    .map(Number::Int)
                    .or_else(|_| t.parse::<f64>().map(Number::Float))
                    .map_err(|_| {
                        CollectionError::invalid_return_value(format!(
                            "non-numeric string {s:?} cannot be summed"
                        ))
                    })
            }
            other => Err(CollectionError::invalid_return_value(format!(
                "{} value cannot be summed",
                other.type_name()
            ))),
        }
    }

    /// Numeric addition. Integers stay integers unless they overflow.
    ///
    /// # Errors
    /// `InvalidReturnValue` when either side is not numeric.
    pub fn add(&self, other: &Self) -> Result<Self> {
        let sum = match (self.number()?, other.number()?) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map_or_else(|| Number::Float(Number::Int(a).as_f64() + Number::Int(b).as_f64()), Number::Int),
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        };
        Ok(sum.into_value())
    }

    /// Convert to a `serde_json::Value`, realizing nested collections.
    ///
    /// # Errors
    /// Propagates failures of nested collections (e.g. duplicate keys).
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null | Self::Bool(false) => Ok(()),
            Self::Bool(true) => write!(f, "1"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Map(_) => match serde_json::to_string(self) {
                Ok(s) => write!(f, "{s}"),
                Err(_) => write!(f, "map"),
            },
            Self::Object(_) => write!(f, "object"),
            Self::Collection(_) => write!(f, "collection"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Key> for Value {
    fn from(k: Key) -> Self {
        match k {
            Key::Int(i) => Self::Int(i),
            Key::Str(s) => Self::Str(s),
        }
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Self::Map(Rc::new(m))
    }
}

impl From<Collection> for Value {
    fn from(c: Collection) -> Self {
        Self::Collection(c)
    }
}

impl<V: Into<Self>> From<Vec<V>> for Value {
    fn from(v: Vec<V>) -> Self {
        Self::list(v)
    }
}

impl<V: Into<Self>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match v {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(b),
            J::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            J::String(s) => Self::Str(s),
            J::Array(items) => Self::list(items),
            J::Object(fields) => Self::map(fields),
        }
    }
}

/// `true` when the keys are exactly `0..n` in order, which serializes as a list.
pub(crate) fn is_list<'a, I: IntoIterator<Item = &'a Key>>(keys: I) -> bool {
    keys.into_iter()
        .enumerate()
        .all(|(i, k)| i64::try_from(i).is_ok_and(|i| k.as_int() == Some(i)))
}

pub(crate) fn serialize_map<S: Serializer>(map: &Map, serializer: S) -> Result<S::Ok, S::Error> {
    if is_list(map.keys()) {
        let mut seq = serializer.serialize_seq(Some(map.len()))?;
        for v in map.values() {
            seq.serialize_element(v)?;
        }
        seq.end()
    } else {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (k, v) in map {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Map(m) => serialize_map(m, serializer),
            Self::Object(o) => o.export().serialize(serializer),
            Self::Collection(c) => c.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_coercion() {
        assert_eq!(Key::from_value(&Value::Int(4)), Key::Int(4));
        assert_eq!(Key::from_value(&Value::from("a")), Key::from("a"));
        assert_eq!(Key::from_value(&Value::Bool(true)), Key::Int(1));
        assert_eq!(Key::from_value(&Value::Null), Key::from(""));
        assert_eq!(Key::from_value(&Value::Float(1.5)), Key::from("1.5"));
        assert_eq!(Key::from_value(&Value::list([1, 2])), Key::from("[1,2]"));
    }

    #[test]
    fn strict_equality_distinguishes_int_and_float() {
        assert_eq!(Value::Int(1), Value::Int(1));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1), Value::Bool(true));
        assert_eq!(Value::from(json!({"a": 1})), Value::from(json!({"a": 1})));
        assert_ne!(Value::from(json!({"a": 1, "b": 2})), Value::from(json!({"b": 2, "a": 1})));
    }

    #[test]
    fn addition_keeps_integers_when_possible() -> Result<()> {
        assert_eq!(Value::Int(2).add(&Value::Int(3))?, Value::Int(5));
        assert_eq!(Value::Int(2).add(&Value::Float(0.5))?, Value::Float(2.5));
        assert_eq!(Value::Null.add(&Value::Int(3))?, Value::Int(3));
        assert_eq!(Value::from("4").add(&Value::Int(1))?, Value::Int(5));
        assert!(Value::list([1]).add(&Value::Int(1)).is_err());
        assert!(Value::from("abc").add(&Value::Int(1)).is_err());
        Ok(())
    }

    #[test]
    fn list_maps_serialize_as_arrays() -> Result<()> {
        assert_eq!(Value::list([1, 2, 3]).to_json()?, json!([1, 2, 3]));
        assert_eq!(Value::map([(2, "x")]).to_json()?, json!({"2": "x"}));
        Ok(())
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.truthy());
        assert!(!Value::from("0").truthy());
        assert!(!Value::Int(0).truthy());
        assert!(Value::from("no").truthy());
        assert!(!Value::list(Vec::<Value>::new()).truthy());
    }
}
