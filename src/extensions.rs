//! Extension points for custom collection operations.
//!
//! This module provides ways to extend keyflow with your own reusable
//! operations:
//!
//! - [`CompositeTransform`]: package several operations into one named component
//! - [`Collection::transform`]: run an ad-hoc function over a whole collection
//!
//! Both build on the public API only, so anything they produce is an ordinary
//! lazily-evaluated [`Collection`].

use crate::collection::Collection;
use crate::error::CollectionError;
use crate::value::Value;
use anyhow::Result;

/// A reusable, packaged sequence of operations.
///
/// Implement this trait to bundle several chained operations into a single,
/// named component, for example a domain-specific cleanup step that several
/// call sites share.
///
/// # Example: Adults By Name
/// ```
/// use keyflow::*;
/// use keyflow::extensions::CompositeTransform;
/// use serde_json::json;
///
/// struct AdultsByName;
///
/// impl CompositeTransform for AdultsByName {
///     fn expand(&self, input: Collection) -> anyhow::Result<Collection> {
///         Ok(input
///             .filter(|p, _| p.get("age").as_i64().is_some_and(|a| a >= 18))
///             .index_by("name")
///             .extract("age"))
///     }
/// }
///
/// # fn main() -> anyhow::Result<()> {
/// let people = Collection::from_json(json!([
///     {"name": "Jon", "age": 14},
///     {"name": "Brienne", "age": 31},
/// ]));
///
/// let adults = people.apply_composite(&AdultsByName)?;
/// assert_eq!(adults.to_json()?, json!([31]));
/// # Ok(())
/// # }
/// ```
pub trait CompositeTransform {
    /// Expand this composite transform into a sequence of operations.
    ///
    /// # Errors
    /// Whatever the implementation decides to reject eagerly.
    fn expand(&self, input: Collection) -> Result<Collection>;
}

impl Collection {
    /// Apply a composite transform to this collection.
    ///
    /// # Errors
    /// Errors returned by [`CompositeTransform::expand`].
    pub fn apply_composite<CT: CompositeTransform + ?Sized>(&self, transform: &CT) -> Result<Self> {
        transform.expand(self.clone())
    }

    /// Hand the whole collection to `transformer`, which must return a collection.
    ///
    /// # Example
    /// ```
    /// use keyflow::*;
    /// use serde_json::json;
    ///
    /// let c = Collection::from(vec![1, 2, 3]);
    /// let doubled = c.transform(|c| Value::from(c.map(|v, _| Value::from(v.as_i64().unwrap_or(0) * 2))))?;
    /// assert_eq!(doubled.to_json()?, json!([2, 4, 6]));
    ///
    /// let err = c.transform(|_| Value::Int(1)).unwrap_err();
    /// assert_eq!(ErrorKind::of(&err), Some(ErrorKind::InvalidReturnValue));
    /// # anyhow::Result::<()>::Ok(())
    /// ```
    ///
    /// # Errors
    /// `InvalidReturnValue` when `transformer` returns anything but a collection.
    pub fn transform<F>(&self, transformer: F) -> Result<Self>
    where
        F: FnOnce(Self) -> Value,
    {
        match transformer(self.clone()) {
            Value::Collection(c) => Ok(c),
            other => Err(CollectionError::invalid_return_value(format!(
                "transform must return a collection, got a {} value",
                other.type_name()
            ))),
        }
    }
}
