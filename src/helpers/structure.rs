//! Structural transforms: joining, slicing, nesting and un-nesting.
//!
//! ## Provided methods
//! - [`concat`](Collection::concat), [`push`](Collection::push),
//!   [`unshift`](Collection::unshift), [`put`](Collection::put),
//!   [`merge`](Collection::merge): add elements
//! - [`slice`](Collection::slice), [`take`](Collection::take): windows by position
//! - [`flatten`](Collection::flatten), [`chunk`](Collection::chunk),
//!   [`split`](Collection::split), [`transpose`](Collection::transpose): change nesting
//! - [`reverse`](Collection::reverse)
//!
//! `reverse`, `chunk`, `split`, `merge` and `transpose` need the whole upstream
//! and realize it when their result is first read.

use crate::collection::{Collection, Pairs, Values};
use crate::error::CollectionError;
use crate::source::Pair;
use crate::value::{Key, Value};
use anyhow::Result;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Tracks the next automatic integer key: one past the largest seen, or 0.
#[derive(Default)]
struct AutoKey(Cell<i64>);

impl AutoKey {
    fn observe(&self, key: &Key) {
        if let Key::Int(i) = key
            && *i >= self.0.get()
        {
            self.0.set(i.saturating_add(1));
        }
    }

    fn next(&self) -> Key {
        let key = self.0.get();
        self.0.set(key.saturating_add(1));
        Key::Int(key)
    }
}

impl Collection {
    /// Upstream values keyed `0..n`, followed by `other`'s pairs with their own keys.
    ///
    /// ```
    /// use keyflow::*;
    /// use serde_json::json;
    ///
    /// let c = Collection::from(vec![1, 3, 3, 2]).with_strict_unique_keys(false);
    /// let joined = c.concat(&Collection::from(vec![4, 5]));
    /// assert_eq!(joined.to_json()?, json!([4, 5, 3, 2]));
    /// assert_eq!(joined.values().count()?, 6);
    /// # anyhow::Result::<()>::Ok(())
    /// ```
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let other = other.clone();
        self.pipe(move |up| {
            Values::new(up)
                .enumerate()
                .map(|(i, item)| item.map(|v| (Key::from(i), v)))
                .chain(Pairs::new(other.clone()))
        })
    }

    /// Append `value` under the next automatic integer key.
    pub fn push<V: Into<Value>>(&self, value: V) -> Self {
        self.append(None, value.into())
    }

    /// Append `value` under `key`.
    pub fn push_keyed<K: Into<Key>, V: Into<Value>>(&self, key: K, value: V) -> Self {
        self.append(Some(key.into()), value.into())
    }

    fn append(&self, key: Option<Key>, value: Value) -> Self {
        self.pipe(move |up| {
            let auto = Rc::new(AutoKey::default());
            let tracker = Rc::clone(&auto);
            let (key, value) = (key.clone(), value.clone());
            Pairs::new(up)
                .inspect(move |item| {
                    if let Ok((k, _)) = item {
                        tracker.observe(k);
                    }
                })
                .chain(std::iter::once_with(move || Ok((key.unwrap_or_else(|| auto.next()), value))))
        })
    }

    /// Prepend `value` under key `0`.
    pub fn unshift<V: Into<Value>>(&self, value: V) -> Self {
        self.unshift_keyed(0, value)
    }

    /// Prepend `value` under `key`.
    pub fn unshift_keyed<K: Into<Key>, V: Into<Value>>(&self, key: K, value: V) -> Self {
        let pair: Pair = (key.into(), value.into());
        self.pipe(move |up| std::iter::once(Ok(pair.clone())).chain(Pairs::new(up)))
    }

    /// Alias of [`unshift`](Self::unshift).
    pub fn prepend<V: Into<Value>>(&self, value: V) -> Self {
        self.unshift(value)
    }

    /// Replace the value stored under `key` in place, or append it when absent.
    pub fn put<K: Into<Key>, V: Into<Value>>(&self, key: K, value: V) -> Self {
        let (key, value) = (key.into(), value.into());
        self.pipe(move |up| {
            let found = Rc::new(Cell::new(false));
            let seen = Rc::clone(&found);
            let (key, value, tail) = (key.clone(), value.clone(), (key.clone(), value.clone()));
            Pairs::new(up)
                .map(move |item| {
                    item.map(|(k, v)| {
                        if k == key {
                            seen.set(true);
                            (k, value.clone())
                        } else {
                            (k, v)
                        }
                    })
                })
                .chain(std::iter::once_with(move || (!found.get()).then_some(Ok(tail))).flatten())
        })
    }

    /// Fold `other` in: string keys replace in place or append, integer keys
    /// append under automatic keys.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let other = other.clone();
        self.pipe_eager("merge", move |up| {
            let mut pairs = up.to_pairs()?;
            let auto = AutoKey::default();
            let mut positions: HashMap<Key, usize> = HashMap::new();
            for (i, (k, _)) in pairs.iter().enumerate() {
                auto.observe(k);
                positions.entry(k.clone()).or_insert(i);
            }
            for (k, v) in other.to_pairs()? {
                let key = match k {
                    Key::Str(_) => k,
                    Key::Int(_) => auto.next(),
                };
                if let Some(&pos) = positions.get(&key) {
                    pairs[pos].1 = v;
                } else {
                    auto.observe(&key);
                    positions.insert(key.clone(), pairs.len());
                    pairs.push((key, v));
                }
            }
            Ok(pairs)
        })
    }

    /// Elements from position `offset`, at most `length` of them.
    ///
    /// A negative `offset` counts from the end; a negative `length` stops that
    /// many elements before the end. Either forces a count of the upstream.
    /// `None` keeps everything after `offset`. Upstream is not pulled past the
    /// last element of the slice, so slicing an infinite sequence is fine as
    /// long as both bounds are non-negative.
    #[must_use]
    pub fn slice(&self, offset: i64, length: Option<i64>) -> Self {
        self.pipe(move |up| {
            let mut bounds: Option<(i64, Option<i64>)> = None;
            let mut index: i64 = 0;
            let mut pairs = Pairs::new(up.clone());
            std::iter::from_fn(move || {
                let (from, to) = match bounds {
                    Some(b) => b,
                    None => match resolve_bounds(&up, offset, length) {
                        Ok(b) => *bounds.insert(b),
                        Err(e) => {
                            bounds = Some((0, Some(0)));
                            return Some(Err(e));
                        }
                    },
                };
                loop {
                    if to.is_some_and(|to| index >= to) {
                        return None;
                    }
                    let item = pairs.next()?;
                    let at = index;
                    index += 1;
                    if item.is_err() || at >= from {
                        return Some(item);
                    }
                }
            })
        })
    }

    /// The first `n` elements.
    #[must_use]
    pub fn take(&self, n: usize) -> Self {
        self.slice(0, Some(i64::try_from(n).unwrap_or(i64::MAX)))
    }

    /// Expand nested maps and collections in place, `depth` levels deep
    /// (`-1` for no limit). Nested elements keep their own keys.
    ///
    /// Self-referential value graphs are not supported.
    #[must_use]
    pub fn flatten(&self, depth: i64) -> Self {
        self.pipe(move |up| {
            let strict = up.is_strict_unique_keys();
            Pairs::new(up).flat_map(move |item| -> Box<dyn Iterator<Item = Result<Pair>>> {
                match item {
                    Ok((k, v)) if depth != 0 => match nested(&v, strict) {
                        Some(inner) => {
                            let child = if depth > 0 { depth - 1 } else { depth };
                            Box::new(inner.flatten(child).into_iter())
                        }
                        None => Box::new(std::iter::once(Ok((k, v)))),
                    },
                    other => Box::new(std::iter::once(other)),
                }
            })
        })
    }

    /// Elements in reverse order, keys preserved.
    #[must_use]
    pub fn reverse(&self) -> Self {
        self.pipe_eager("reverse", |up| {
            let mut pairs = up.to_pairs()?;
            pairs.reverse();
            Ok(pairs)
        })
    }

    /// Collections of at most `size` elements each, keyed `0..n`.
    ///
    /// Works on [`to_array`](Self::to_array), so repeated keys collapse first.
    /// With `preserve_keys` off every chunk is keyed `0..size`.
    #[must_use]
    pub fn chunk(&self, size: usize, preserve_keys: bool) -> Self {
        if size == 0 {
            return self.failing(CollectionError::InvalidArgument("chunk size must be positive".into()));
        }
        self.pipe_eager("chunk", move |up| chunked(up, size, preserve_keys))
    }

    /// Split into `groups` chunks of equal size (the last may be shorter).
    #[must_use]
    pub fn split(&self, groups: usize, preserve_keys: bool) -> Self {
        if groups == 0 {
            return self.failing(CollectionError::InvalidArgument("split needs at least one group".into()));
        }
        self.pipe_eager("split", move |up| {
            let entries: Vec<Pair> = up.to_array()?.into_iter().collect();
            let size = entries.len().div_ceil(groups).max(1);
            Ok(chunk_pairs(&entries, size, preserve_keys, up.is_strict_unique_keys()))
        })
    }

    /// Swap rows and columns of a collection of collections.
    ///
    /// Row `i` of the result holds the `i`-th value of every inner collection,
    /// padded with `Null` where an inner collection is shorter.
    ///
    /// ```
    /// use keyflow::*;
    /// use serde_json::json;
    ///
    /// let grid = Collection::from(vec![
    ///     Value::from(Collection::from(vec![1, 2, 3])),
    ///     Value::from(Collection::from(vec![4, 5])),
    /// ]);
    /// assert_eq!(grid.transpose().to_json()?, json!([[1, 4], [2, 5], [3, null]]));
    /// # anyhow::Result::<()>::Ok(())
    /// ```
    #[must_use]
    pub fn transpose(&self) -> Self {
        let strict = self.is_strict_unique_keys();
        self.pipe_eager("transpose", move |up| {
            let mut columns: Vec<Vec<Value>> = Vec::new();
            for value in up.to_values()? {
                match value {
                    Value::Collection(inner) => {
                        columns.push(inner.to_array()?.into_values().collect());
                    }
                    other => {
                        return Err(CollectionError::invalid_argument(format!(
                            "can only transpose collections of collections, found a {} value",
                            other.type_name()
                        )));
                    }
                }
            }
            let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
            Ok((0..rows)
                .map(|i| {
                    let row: Collection = columns
                        .iter()
                        .map(|col| col.get(i).cloned().unwrap_or_default())
                        .collect();
                    (Key::from(i), Value::from(row.with_strict_unique_keys(strict)))
                })
                .collect())
        })
    }
}

/// Resolve slice bounds to `[from, to)` positions; `to` is `None` when open-ended.
fn resolve_bounds(up: &Collection, offset: i64, length: Option<i64>) -> Result<(i64, Option<i64>)> {
    let needs_count = offset < 0 || length.is_some_and(|l| l < 0);
    let count = if needs_count {
        i64::try_from(up.count()?).unwrap_or(i64::MAX)
    } else {
        0
    };
    let from = if offset >= 0 { offset } else { (count + offset).max(0) };
    let to = match length {
        None => None,
        Some(l) if l >= 0 => Some(from.saturating_add(l)),
        Some(l) => Some(count + l),
    };
    Ok((from, to))
}

/// Nested container of a value, as a collection to recurse into.
fn nested(value: &Value, strict: bool) -> Option<Collection> {
    match value {
        Value::Map(map) => Some(
            Collection::from_pairs(map.iter().map(|(k, v)| (k.clone(), v.clone())))
                .with_strict_unique_keys(strict),
        ),
        Value::Collection(c) => Some(c.clone()),
        _ => None,
    }
}

fn chunked(up: &Collection, size: usize, preserve_keys: bool) -> Result<Vec<Pair>> {
    let entries: Vec<Pair> = up.to_array()?.into_iter().collect();
    Ok(chunk_pairs(&entries, size, preserve_keys, up.is_strict_unique_keys()))
}

fn chunk_pairs(entries: &[Pair], size: usize, preserve_keys: bool, strict: bool) -> Vec<Pair> {
    entries
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| {
            let inner = if preserve_keys {
                Collection::from_pairs(chunk.iter().cloned())
            } else {
                chunk.iter().map(|(_, v)| v.clone()).collect()
            };
            (Key::from(i), Value::from(inner.with_strict_unique_keys(strict)))
        })
        .collect()
}
