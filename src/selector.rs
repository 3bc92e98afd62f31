//! Selector resolution.
//!
//! Many operations (`extract`, `index_by`, `sort_by`, `group_by`, `sum`, …) take
//! a [`Selector`] describing *what* to read from each element:
//!
//! - [`Selector::None`]: the element itself, which must be scalar.
//! - [`Selector::Key`]: a key or property name, resolved against the element's
//!   [`Shape`] (offset access, raw mapping, or object property).
//! - [`Selector::Fn`]: an arbitrary function of the element.
//!
//! Strings always mean keys; there is no way to name a function by string.
//! [`resolve`] turns a selector into an [`Extractor`] once, and the operation
//! then calls it for every element.
//!
//! ```
//! use keyflow::{resolve, Selector, Value};
//!
//! let by_name = resolve(&Selector::from("name"));
//! let row = Value::from(serde_json::json!({"name": "Arya", "age": 11}));
//! assert_eq!(by_name(&row).unwrap(), Value::from("Arya"));
//! ```

use crate::error::CollectionError;
use crate::value::{Key, Map, Object, OffsetAccess, Value};
use anyhow::Result;
use std::fmt;
use std::rc::Rc;

/// A resolved value extractor.
pub type Extractor = Rc<dyn Fn(&Value) -> Result<Value>>;

/// Specifier of what to read from each element.
#[derive(Clone, Default)]
pub enum Selector {
    #[default]
    None,
    Key(Key),
    Fn(Rc<dyn Fn(&Value) -> Value>),
}

impl Selector {
    /// Selector backed by a closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        Self::Fn(Rc::new(f))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "Selector::None"),
            Self::Key(k) => write!(f, "Selector::Key({k})"),
            Self::Fn(_) => write!(f, "Selector::Fn(..)"),
        }
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Self::Key(Key::from(s))
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Self::Key(Key::from(s))
    }
}

impl From<i64> for Selector {
    fn from(i: i64) -> Self {
        Self::Key(Key::Int(i))
    }
}

impl From<i32> for Selector {
    fn from(i: i32) -> Self {
        Self::Key(Key::from(i))
    }
}

impl From<Key> for Selector {
    fn from(k: Key) -> Self {
        Self::Key(k)
    }
}

impl From<Option<Key>> for Selector {
    fn from(k: Option<Key>) -> Self {
        k.map_or(Self::None, Self::Key)
    }
}

/// The capability a value offers to a key selector, decided once per lookup.
pub enum Shape<'a> {
    /// An object with offset access; falls back to property lookup when the
    /// offset is missing.
    Indexable(&'a dyn Object, &'a dyn OffsetAccess),
    Mapping(&'a Map),
    Object(&'a dyn Object),
    Neither,
}

impl<'a> Shape<'a> {
    #[must_use]
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Object(obj) => obj
                .offsets()
                .map_or(Shape::Object(obj.as_ref()), |offsets| {
                    Shape::Indexable(obj.as_ref(), offsets)
                }),
            Value::Map(map) => Shape::Mapping(map),
            _ => Shape::Neither,
        }
    }
}

fn property(obj: &dyn Object, key: &Key) -> Result<Value> {
    let name = key.property_name();
    obj.property(&name).ok_or_else(|| {
        CollectionError::invalid_return_value(format!("object has no property {name:?}"))
    })
}

/// Read `key` from `value`.
///
/// A missing key in a raw mapping, or a value of no supported shape, yields
/// `Null`. A missing property on an object is an `InvalidReturnValue` error.
///
/// # Errors
/// `InvalidReturnValue` when an object has neither the offset nor the property.
pub fn lookup(value: &Value, key: &Key) -> Result<Value> {
    match Shape::of(value) {
        Shape::Indexable(obj, offsets) => {
            if offsets.offset_exists(key) {
                Ok(offsets.offset_get(key))
            } else {
                property(obj, key)
            }
        }
        Shape::Mapping(map) => Ok(map.get(key).cloned().unwrap_or_default()),
        Shape::Object(obj) => property(obj, key),
        Shape::Neither => Ok(Value::Null),
    }
}

/// Turn a selector into an extractor.
#[must_use]
pub fn resolve(selector: &Selector) -> Extractor {
    match selector {
        Selector::None => Rc::new(|value: &Value| {
            if value.is_scalar() {
                Ok(value.clone())
            } else {
                Err(CollectionError::invalid_return_value(format!(
                    "expected a scalar value, got {}",
                    value.type_name()
                )))
            }
        }),
        Selector::Key(key) => {
            let key = key.clone();
            Rc::new(move |value: &Value| lookup(value, &key))
        }
        Selector::Fn(f) => {
            let f = Rc::clone(f);
            Rc::new(move |value: &Value| Ok(f(value)))
        }
    }
}
