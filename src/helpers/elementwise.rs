//! Element-wise transforms.
//!
//! Every method here is lazy: it returns a new [`Collection`] whose passes
//! pull from the receiver one element at a time.
//!
//! ## Provided methods
//! - [`map`](Collection::map), [`each`](Collection::each): per-pair function, keys preserved
//! - [`filter`](Collection::filter), [`reject`](Collection::reject),
//!   [`filter_truthy`](Collection::filter_truthy): keep a subsequence
//! - [`keys`](Collection::keys), [`values`](Collection::values),
//!   [`extract`](Collection::extract) (alias [`parts`](Collection::parts)), [`flip`](Collection::flip),
//!   [`index_by`](Collection::index_by): reshape keys and values
//! - [`distinct`](Collection::distinct), [`take_nth`](Collection::take_nth),
//!   [`only`](Collection::only), [`except`](Collection::except),
//!   [`diff`](Collection::diff), [`intersect`](Collection::intersect)
//!
//! ## Example
//! ```
//! use keyflow::*;
//! use serde_json::json;
//!
//! let people = Collection::from_json(json!([
//!     {"name": "Jon", "age": 14},
//!     {"name": "Arya", "age": 11},
//!     {"name": "Sansa", "age": 13},
//! ]));
//!
//! let names = people
//!     .filter(|person, _| person.get("age").as_i64().is_some_and(|a| a > 12))
//!     .extract("name");
//!
//! assert_eq!(names.to_json()?, json!(["Jon", "Sansa"]));
//! # anyhow::Result::<()>::Ok(())
//! ```

use crate::collection::{Collection, Pairs, Values};
use crate::error::CollectionError;
use crate::selector::{resolve, Selector};
use crate::value::{Key, Value};
use std::rc::Rc;

impl Collection {
    /// Apply `f(value, key)` to every element, keeping keys.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Key) -> Value + 'static,
    {
        let f = Rc::new(f);
        self.pipe(move |up| {
            let f = Rc::clone(&f);
            Pairs::new(up).map(move |item| {
                item.map(|(k, v)| {
                    let mapped = f(&v, &k);
                    (k, mapped)
                })
            })
        })
    }

    /// Call `f(value, key)` for every element as it passes through.
    pub fn each<F>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Key) + 'static,
    {
        let f = Rc::new(f);
        self.pipe(move |up| {
            let f = Rc::clone(&f);
            Pairs::new(up).inspect(move |item| {
                if let Ok((k, v)) = item {
                    f(v, k);
                }
            })
        })
    }

    /// Keep the elements for which `f(value, key)` is true, in their original order.
    pub fn filter<F>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Key) -> bool + 'static,
    {
        let f = Rc::new(f);
        self.pipe(move |up| {
            let f = Rc::clone(&f);
            Pairs::new(up).filter(move |item| match item {
                Ok((k, v)) => f(v, k),
                Err(_) => true,
            })
        })
    }

    /// Drop the elements for which `f(value, key)` is true.
    pub fn reject<F>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Key) -> bool + 'static,
    {
        self.filter(move |v, k| !f(v, k))
    }

    /// Keep truthy values.
    #[must_use]
    pub fn filter_truthy(&self) -> Self {
        self.filter(|v, _| v.truthy())
    }

    /// The keys, as values keyed `0..n`.
    #[must_use]
    pub fn keys(&self) -> Self {
        self.pipe(|up| {
            Pairs::new(up)
                .enumerate()
                .map(|(i, item)| item.map(|(k, _)| (Key::from(i), Value::from(k))))
        })
    }

    /// The values, keyed `0..n`.
    ///
    /// Upstream keys are never requested, which makes this the escape hatch
    /// from `DuplicateKey` errors.
    #[must_use]
    pub fn values(&self) -> Self {
        self.pipe(|up| {
            Values::new(up)
                .enumerate()
                .map(|(i, item)| item.map(|v| (Key::from(i), v)))
        })
    }

    /// What `selector` reads from every value, keyed `0..n`.
    pub fn extract<S: Into<Selector>>(&self, selector: S) -> Self {
        let ex = resolve(&selector.into());
        self.pipe(move |up| {
            let ex = Rc::clone(&ex);
            Values::new(up)
                .enumerate()
                .map(move |(i, item)| item.and_then(|v| Ok((Key::from(i), ex(&v)?))))
        })
    }

    /// Swap keys and values. Values are coerced to keys.
    #[must_use]
    pub fn flip(&self) -> Self {
        self.pipe(|up| {
            Pairs::new(up).map(|item| item.map(|(k, v)| (Key::from_value(&v), Value::from(k))))
        })
    }

    /// Re-key every value by what `selector` reads from it.
    ///
    /// Upstream is read values-only. When the selector yields `Null` the
    /// element's position is used instead.
    ///
    /// ### Example
    /// ```
    /// use keyflow::*;
    /// use serde_json::json;
    ///
    /// let rows = Collection::from_json(json!([{"id": "a"}, {"x": 1}]));
    /// let keyed = rows.index_by("id").keys();
    /// assert_eq!(keyed.to_json()?, json!(["a", 1]));
    /// # anyhow::Result::<()>::Ok(())
    /// ```
    pub fn index_by<S: Into<Selector>>(&self, selector: S) -> Self {
        let ex = resolve(&selector.into());
        self.pipe(move |up| {
            let ex = Rc::clone(&ex);
            Values::new(up).enumerate().map(move |(i, item)| {
                item.and_then(|v| {
                    let selected = ex(&v)?;
                    let key = if selected.is_null() {
                        Key::from(i)
                    } else {
                        Key::from_value(&selected)
                    };
                    Ok((key, v))
                })
            })
        })
    }

    /// First occurrence of every strictly-equal value, keys preserved.
    #[must_use]
    pub fn distinct(&self) -> Self {
        self.pipe(|up| {
            let mut seen: Vec<Value> = Vec::new();
            Pairs::new(up).filter(move |item| match item {
                Ok((_, v)) => {
                    if seen.iter().any(|s| s.strict_eq(v)) {
                        false
                    } else {
                        seen.push(v.clone());
                        true
                    }
                }
                Err(_) => true,
            })
        })
    }

    /// Every `step`-th element starting at position `offset`.
    ///
    /// A `step` of zero fails with `InvalidArgument` when the result is read.
    #[must_use]
    pub fn take_nth(&self, step: usize, offset: usize) -> Self {
        if step == 0 {
            return self.failing(CollectionError::InvalidArgument("take_nth step must be positive".into()));
        }
        self.pipe(move |up| {
            Pairs::new(up)
                .enumerate()
                .filter(move |(i, item)| item.is_err() || i % step == offset)
                .map(|(_, item)| item)
        })
    }

    /// Alias of [`extract`](Self::extract).
    pub fn parts<S: Into<Selector>>(&self, selector: S) -> Self {
        self.extract(selector)
    }

    /// Alias of [`take_nth`](Self::take_nth).
    #[must_use]
    pub fn nth(&self, step: usize, offset: usize) -> Self {
        self.take_nth(step, offset)
    }

    /// Keep the pairs whose key is listed.
    pub fn only<K, I>(&self, keys: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = K>,
    {
        let keys: Rc<[Key]> = keys.into_iter().map(Into::into).collect();
        self.filter(move |_, k| keys.contains(k))
    }

    /// Drop the pairs whose key is listed.
    pub fn except<K, I>(&self, keys: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = K>,
    {
        let keys: Rc<[Key]> = keys.into_iter().map(Into::into).collect();
        self.reject(move |_, k| keys.contains(k))
    }

    /// Drop the pairs whose value strictly equals a value of `other`.
    #[must_use]
    pub fn diff(&self, other: &Self) -> Self {
        self.by_membership(other, false)
    }

    /// Keep the pairs whose value strictly equals a value of `other`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        self.by_membership(other, true)
    }

    fn by_membership(&self, other: &Self, keep_members: bool) -> Self {
        let other = other.clone();
        self.pipe(move |up| {
            let other = other.clone();
            let mut pool: Option<Vec<Value>> = None;
            Pairs::new(up).filter_map(move |item| {
                let (k, v) = match item {
                    Ok(pair) => pair,
                    Err(e) => return Some(Err(e)),
                };
                if pool.is_none() {
                    match other.to_values() {
                        Ok(values) => pool = Some(values),
                        Err(e) => return Some(Err(e)),
                    }
                }
                let member = pool.as_ref().is_some_and(|p| p.iter().any(|x| x.strict_eq(&v)));
                (member == keep_members).then_some(Ok((k, v)))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::{Collection, Value};
    use serde_json::json;

    #[test]
    fn take_nth_with_zero_step_fails_lazily() {
        let c = Collection::from(vec![1, 2, 3]).take_nth(0, 0);
        let err = c.to_array().unwrap_err();
        assert_eq!(ErrorKind::of(&err), Some(ErrorKind::InvalidArgument));
    }

    #[test]
    fn map_sees_keys() -> anyhow::Result<()> {
        let c = Collection::from_pairs([("a", 1), ("b", 2)]);
        let out = c.map(|v, k| Value::from(format!("{}{}", k.as_str().unwrap_or(""), v)));
        assert_eq!(out.to_json()?, json!({"a": "a1", "b": "b2"}));
        Ok(())
    }
}
