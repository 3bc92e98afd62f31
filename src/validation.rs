//! Validating constructors for collections whose items must share a shape.
//!
//! Both constructors realize their input once, check every item, and hand back
//! an ordinary fixed [`Collection`] keeping the original keys. The first item of
//! the wrong shape aborts construction with [`CollectionError::InvalidType`].
//!
//! - [`array_collection`]: every item is a map, or an object with offset access
//! - [`collection_collection`]: every item is itself a collection
//!
//! # Example
//!
//! ```
//! use keyflow::*;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let rows = array_collection(json!([{"id": 1}, {"id": 2}]))?;
//! assert_eq!(rows.extract("id").to_json()?, json!([1, 2]));
//!
//! let err = array_collection(json!([{"id": 1}, 2])).unwrap_err();
//! assert_eq!(ErrorKind::of(&err), Some(ErrorKind::InvalidType));
//!
//! let nested = collection_collection(vec![Collection::from(vec![1]), Collection::from(vec![2, 3])])?;
//! assert_eq!(nested.count()?, 2);
//! # Ok(())
//! # }
//! ```

use crate::collection::Collection;
use crate::error::CollectionError;
use crate::source::{Input, Pair};
use crate::value::Value;
use anyhow::Result;
use log::warn;

fn validated<I, F>(input: I, expected: &str, accepts: F) -> Result<Collection>
where
    I: Into<Input>,
    F: Fn(&Value) -> bool,
{
    let pairs: Vec<Pair> = Collection::try_new(input)?.to_pairs()?;
    if let Some((key, value)) = pairs.iter().find(|(_, v)| !accepts(v)) {
        warn!("rejected item at key {key}: expected {expected}, got {}", value.type_name());
        return Err(CollectionError::InvalidType(format!(
            "item at key {key} is a {} value, expected {expected}",
            value.type_name()
        ))
        .into());
    }
    Ok(Collection::from_pairs(pairs))
}

/// A collection whose every item is a map or an object with offset access.
///
/// # Errors
/// `InvalidType` for the first item of another shape, or any error raised
/// while realizing `items`.
pub fn array_collection<I: Into<Input>>(items: I) -> Result<Collection> {
    validated(items, "an array-like value", |v| match v {
        Value::Map(_) => true,
        Value::Object(o) => o.offsets().is_some(),
        _ => false,
    })
}

/// A collection whose every item is itself a collection.
///
/// # Errors
/// `InvalidType` for the first item that is not a collection, or any error
/// raised while realizing `items`.
pub fn collection_collection<I: Into<Input>>(items: I) -> Result<Collection> {
    validated(items, "a collection", |v| matches!(v, Value::Collection(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn keys_survive_validation() -> Result<()> {
        let c = array_collection(json!({"a": {"x": 1}, "b": {"x": 2}}))?;
        assert_eq!(c.keys().to_json()?, json!(["a", "b"]));
        Ok(())
    }

    #[test]
    fn plain_values_are_not_collections() {
        let err = collection_collection(json!([[1], [2]])).unwrap_err();
        assert_eq!(ErrorKind::of(&err), Some(ErrorKind::InvalidType));
    }
}
