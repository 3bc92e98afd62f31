//! Reductions, lookups and grouping.
//!
//! Most methods here are *terminal*: they drive a pass and return a plain
//! result. The grouping methods return a new collection, realized when first
//! read.
//!
//! ## Provided methods
//! - numeric: [`sum`](Collection::sum), [`avg`](Collection::avg),
//!   [`median`](Collection::median), [`min`](Collection::min), [`max`](Collection::max),
//!   [`min_by`](Collection::min_by), [`max_by`](Collection::max_by)
//! - folding: [`reduce`](Collection::reduce), [`implode`](Collection::implode)
//! - predicates: [`contains`](Collection::contains), [`every`](Collection::every),
//!   [`some`](Collection::some), [`has`](Collection::has),
//!   [`is_empty`](Collection::is_empty), [`is_not_empty`](Collection::is_not_empty)
//! - lookups: [`find`](Collection::find), [`first`](Collection::first),
//!   [`last`](Collection::last), [`get`](Collection::get)
//! - grouping: [`group_by`](Collection::group_by), [`count_by`](Collection::count_by),
//!   [`frequencies`](Collection::frequencies)
//!
//! ## Example
//! ```
//! use keyflow::*;
//! use serde_json::json;
//!
//! let ages = Collection::from_json(json!([{"age": 10}, {"age": 20}, {"age": 33}]));
//! assert_eq!(ages.sum("age")?, Value::Int(63));
//! assert_eq!(ages.avg("age")?, Value::Float(21.0));
//! assert_eq!(ages.max("age")?, Value::Int(33));
//! # anyhow::Result::<()>::Ok(())
//! ```

use crate::collection::Collection;
use crate::error::CollectionError;
use crate::selector::{resolve, Extractor, Selector};
use crate::source::Pair;
use crate::utils::natural_cmp;
use crate::value::{Key, Map, Value};
use anyhow::Result;
use std::cmp::Ordering;
use std::rc::Rc;

impl Collection {
    /// Alias of [`to_array`](Self::to_array).
    ///
    /// # Errors
    /// Same as [`to_array`](Self::to_array).
    pub fn all(&self) -> Result<Map> {
        self.to_array()
    }

    /// Sum of what `selector` reads from every value. An empty collection sums to `0`.
    ///
    /// # Errors
    /// `InvalidReturnValue` for non-numeric values.
    pub fn sum<S: Into<Selector>>(&self, selector: S) -> Result<Value> {
        add_up(self.iter_values(), &resolve(&selector.into()))
    }

    /// Arithmetic mean. The values are realized in a single pass.
    ///
    /// # Errors
    /// `EmptyCollection` on an empty collection, plus the errors of [`sum`](Self::sum).
    #[allow(clippy::cast_precision_loss)]
    pub fn avg<S: Into<Selector>>(&self, selector: S) -> Result<Value> {
        let values = self.to_values()?;
        if values.is_empty() {
            return Err(CollectionError::empty("the average"));
        }
        let count = values.len() as f64;
        let total = add_up(values.into_iter().map(Ok), &resolve(&selector.into()))?;
        Ok(Value::Float(total.as_f64().unwrap_or_default() / count))
    }

    /// Median of the non-null values `selector` reads. With an even number of
    /// values, the mean of the two middle ones.
    ///
    /// # Errors
    /// `EmptyCollection` when no non-null value remains.
    pub fn median<S: Into<Selector>>(&self, selector: S) -> Result<Value> {
        let values = self.extract(selector).filter(|v, _| !v.is_null()).sort().values();
        let mut sorted = values.to_values()?;
        let n = sorted.len();
        if n == 0 {
            return Err(CollectionError::empty("the median"));
        }
        if n % 2 == 1 {
            return Ok(sorted.swap_remove(n / 2));
        }
        Collection::from(vec![sorted[n / 2 - 1].clone(), sorted[n / 2].clone()]).avg(Selector::None)
    }

    fn extreme<S: Into<Selector>>(&self, selector: S, wanted: Ordering, op: &str) -> Result<Value> {
        let ex = resolve(&selector.into());
        let mut best: Option<Value> = None;
        for value in self.iter_values() {
            let candidate = ex(&value?)?;
            if best.as_ref().is_none_or(|b| natural_cmp(&candidate, b) == wanted) {
                best = Some(candidate);
            }
        }
        best.ok_or_else(|| CollectionError::empty(op))
    }

    /// Smallest value read by `selector`.
    ///
    /// # Errors
    /// `EmptyCollection` on an empty collection.
    pub fn min<S: Into<Selector>>(&self, selector: S) -> Result<Value> {
        self.extreme(selector, Ordering::Less, "the minimum")
    }

    /// Largest value read by `selector`.
    ///
    /// # Errors
    /// `EmptyCollection` on an empty collection.
    pub fn max<S: Into<Selector>>(&self, selector: S) -> Result<Value> {
        self.extreme(selector, Ordering::Greater, "the maximum")
    }

    fn extreme_pairs<S: Into<Selector>>(&self, selector: S, wanted: Ordering) -> Self {
        let ex = resolve(&selector.into());
        self.pipe_eager("extreme", move |up| {
            let mut best: Option<Value> = None;
            let mut winners: Vec<Pair> = Vec::new();
            for pair in up.iter() {
                let pair = pair?;
                let candidate = ex(&pair.1)?;
                let order = best.as_ref().map_or(wanted, |b| natural_cmp(&candidate, b));
                if order == wanted {
                    best = Some(candidate);
                    winners.clear();
                }
                if order == wanted || order == Ordering::Equal {
                    winners.push(pair);
                }
            }
            Ok(winners)
        })
    }

    /// Every element whose selected value is the minimum, keys preserved.
    pub fn min_by<S: Into<Selector>>(&self, selector: S) -> Self {
        self.extreme_pairs(selector, Ordering::Less)
    }

    /// Every element whose selected value is the maximum, keys preserved.
    pub fn max_by<S: Into<Selector>>(&self, selector: S) -> Self {
        self.extreme_pairs(selector, Ordering::Greater)
    }

    /// Fold with `f(carry, value, key)`. A `Map` carry is returned as a collection.
    ///
    /// # Errors
    /// Any error raised upstream.
    pub fn reduce<F, V>(&self, f: F, initial: V) -> Result<Value>
    where
        F: Fn(Value, &Value, &Key) -> Value,
        V: Into<Value>,
    {
        let mut carry = initial.into();
        for pair in self.iter() {
            let (k, v) = pair?;
            carry = f(carry, &v, &k);
        }
        Ok(match carry {
            Value::Map(map) => {
                Value::from(Collection::from((*map).clone()).with_strict_unique_keys(self.is_strict_unique_keys()))
            }
            other => other,
        })
    }

    /// Join what `selector` reads from every value with `glue`.
    ///
    /// # Errors
    /// Selector failures.
    pub fn implode<S: Into<Selector>>(&self, glue: &str, selector: S) -> Result<String> {
        let parts = self.extract(selector).to_values()?;
        Ok(parts.iter().map(ToString::to_string).collect::<Vec<_>>().join(glue))
    }

    /// Whether some value strictly equals `needle`.
    ///
    /// # Errors
    /// Any error raised upstream.
    pub fn contains<V: Into<Value>>(&self, needle: V) -> Result<bool> {
        let needle = needle.into();
        for pair in self.iter() {
            if pair?.1.strict_eq(&needle) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether `f(value, key)` holds for every element. Stops at the first miss.
    ///
    /// # Errors
    /// Any error raised upstream.
    pub fn every<F: Fn(&Value, &Key) -> bool>(&self, f: F) -> Result<bool> {
        for pair in self.iter() {
            let (k, v) = pair?;
            if !f(&v, &k) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether `f(value, key)` holds for some element. Stops at the first hit.
    ///
    /// # Errors
    /// Any error raised upstream.
    pub fn some<F: Fn(&Value, &Key) -> bool>(&self, f: F) -> Result<bool> {
        Ok(self.find(f)?.is_some())
    }

    /// First value for which `f(value, key)` holds.
    ///
    /// # Errors
    /// Any error raised upstream.
    pub fn find<F: Fn(&Value, &Key) -> bool>(&self, f: F) -> Result<Option<Value>> {
        for pair in self.iter() {
            let (k, v) = pair?;
            if f(&v, &k) {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    /// First value. Keys are not requested.
    ///
    /// # Errors
    /// Any error raised upstream.
    pub fn first(&self) -> Result<Option<Value>> {
        self.iter_values().next().transpose()
    }

    /// Last value.
    ///
    /// # Errors
    /// Any error raised upstream.
    pub fn last(&self) -> Result<Option<Value>> {
        let mut last = None;
        for value in self.iter_values() {
            last = Some(value?);
        }
        Ok(last)
    }

    /// Value stored under `key`.
    ///
    /// # Errors
    /// Any error raised upstream.
    pub fn get<K: Into<Key>>(&self, key: K) -> Result<Option<Value>> {
        let key = key.into();
        for pair in self.iter() {
            let (k, v) = pair?;
            if k == key {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    /// Whether `key` is present.
    ///
    /// # Errors
    /// Any error raised upstream.
    pub fn has<K: Into<Key>>(&self, key: K) -> Result<bool> {
        self.keys().contains(Value::from(key.into()))
    }

    /// Whether the collection yields no element. Keys are not requested.
    ///
    /// # Errors
    /// Any error raised upstream.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.first()?.is_none())
    }

    /// # Errors
    /// Any error raised upstream.
    pub fn is_not_empty(&self) -> Result<bool> {
        Ok(!self.is_empty()?)
    }

    /// Group values by what `selector` reads from them.
    ///
    /// Each group is a collection of the group's values keyed `0..n`, stored
    /// under the selected value coerced to a key. Groups appear in order of
    /// first occurrence.
    ///
    /// ```
    /// use keyflow::*;
    /// use serde_json::json;
    ///
    /// let c = Collection::from_json(json!([
    ///     {"team": "red", "n": 1},
    ///     {"team": "blue", "n": 2},
    ///     {"team": "red", "n": 3},
    /// ]));
    /// let groups = c.group_by("team").map(|g, _| g.as_collection().map_or(Value::Null, |g| g.sum("n").unwrap_or_default()));
    /// assert_eq!(groups.to_json()?, json!({"red": 4, "blue": 2}));
    /// # anyhow::Result::<()>::Ok(())
    /// ```
    pub fn group_by<S: Into<Selector>>(&self, selector: S) -> Self {
        let ex = resolve(&selector.into());
        let strict = self.is_strict_unique_keys();
        self.pipe_eager("group_by", move |up| {
            let mut groups: indexmap::IndexMap<Key, Vec<Value>> = indexmap::IndexMap::new();
            for pair in up.iter() {
                let (_, v) = pair?;
                let key = Key::from_value(&ex(&v)?);
                groups.entry(key).or_default().push(v);
            }
            Ok(groups
                .into_iter()
                .map(|(k, members)| {
                    let group: Collection = members.into_iter().collect();
                    (k, Value::from(group.with_strict_unique_keys(strict)))
                })
                .collect())
        })
    }

    /// Number of values per selected key.
    pub fn count_by<S: Into<Selector>>(&self, selector: S) -> Self {
        self.group_by(selector).pipe_eager("count_by", |groups| {
            groups
                .to_pairs()?
                .into_iter()
                .map(|(k, group)| {
                    let n = group.as_collection().map_or(Ok(0), Collection::count)?;
                    Ok((k, Value::from(n)))
                })
                .collect()
        })
    }

    /// Number of occurrences of every value.
    #[must_use]
    pub fn frequencies(&self) -> Self {
        self.count_by(Selector::Fn(Rc::new(Value::clone)))
    }
}

fn add_up<I: IntoIterator<Item = Result<Value>>>(values: I, ex: &Extractor) -> Result<Value> {
    let mut total = Value::Int(0);
    for value in values {
        total = total.add(&ex(&value?)?)?;
    }
    Ok(total)
}
