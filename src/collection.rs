//! The [`Collection`] type and its iteration engine.
//!
//! A collection is a *definition* of a sequence of `(Key, Value)` pairs plus
//! the live state of one traversal over it. Every chainable operation builds a
//! new collection whose source is a factory that re-drives its upstream from
//! the start, so derived collections can be walked any number of times.
//!
//! The protocol is the usual four primitives plus an explicit restart:
//!
//! ```
//! use keyflow::*;
//! # fn main() -> anyhow::Result<()> {
//! let mut c = Collection::from(vec![10, 20]);
//! c.restart()?;
//! let mut seen = Vec::new();
//! while !c.at_end() {
//!     let key = c.key()?;
//!     seen.push((key, c.value().cloned()));
//!     c.advance()?;
//! }
//! assert_eq!(seen.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! Most code never touches the protocol directly and uses [`Collection::iter`]
//! or the terminal operations instead.

use crate::error::CollectionError;
use crate::selector::Selector;
use crate::source::{into_pair, Cursor, Factory, Generator, Input, Pair, Source};
use crate::value::{serialize_map, Key, Map, Value};
use anyhow::Result;
use log::debug;
use serde::ser::{Error as _, Serialize, Serializer};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// A lazily-evaluated sequence of key/value pairs.
pub struct Collection {
    source: Source,
    cursor: Option<Cursor>,
    cached_count: Cell<Option<usize>>,
    strict_unique_keys: bool,
    observed_keys: HashSet<Key>,
    key_checked: bool,
}

impl Clone for Collection {
    /// Clones share the source definition but start with their own cursor and
    /// an empty set of observed keys.
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            cursor: None,
            cached_count: Cell::new(self.cached_count.get()),
            strict_unique_keys: self.strict_unique_keys,
            observed_keys: HashSet::new(),
            key_checked: false,
        }
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("source", &self.source.kind())
            .field("strict_unique_keys", &self.strict_unique_keys)
            .field("cached_count", &self.cached_count.get())
            .finish_non_exhaustive()
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl Collection {
    fn assemble(source: Source, strict_unique_keys: bool) -> Self {
        Self {
            source,
            cursor: None,
            cached_count: Cell::new(None),
            strict_unique_keys,
            observed_keys: HashSet::new(),
            key_checked: false,
        }
    }

    /// An empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::assemble(Source::empty(), true)
    }

    /// Build a collection from any supported input.
    ///
    /// # Errors
    /// `InvalidArgument` for inputs that are neither pairs, a map, a factory,
    /// a lazy sequence nor a collection. `InvalidReturnValue` when a factory
    /// produces something unusable on its first invocation.
    pub fn try_new<I: Into<Input>>(input: I) -> Result<Self> {
        Ok(Self::assemble(Source::install(input.into())?, true))
    }

    /// Build a collection and immediately index it by `selector`.
    ///
    /// # Errors
    /// Same as [`try_new`](Self::try_new).
    pub fn indexed<I, S>(input: I, selector: S) -> Result<Self>
    where
        I: Into<Input>,
        S: Into<Selector>,
    {
        Ok(Self::try_new(input)?.index_by(selector))
    }

    /// Fixed collection from explicit pairs. Repeated keys are kept.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs: Vec<Pair> = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self::assemble(Source::Fixed(Rc::from(pairs)), true)
    }

    /// Collection regenerated from `factory` on every pass.
    ///
    /// The factory is invoked once right away to obtain the first sequence,
    /// which the first pass then consumes.
    ///
    /// ```
    /// use keyflow::*;
    /// # fn main() -> anyhow::Result<()> {
    /// let c = Collection::from_factory(|| Input::lazy_values(1..=3))?;
    /// assert_eq!(c.count()?, 3);
    /// assert_eq!(c.sum(Selector::None)?, Value::Int(6));
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// `InvalidReturnValue` if the first invocation produces an unusable input.
    pub fn from_factory<F, I>(factory: F) -> Result<Self>
    where
        F: Fn() -> I + 'static,
        I: Into<Input> + 'static,
    {
        let factory: Factory = Rc::new(move || factory().into());
        Self::try_new(Input::Factory(factory))
    }

    /// One-shot collection over a lazy sequence. It supports a single pass;
    /// a second one fails with `SequenceConsumed`.
    pub fn from_generator<K, V, I>(pairs: I) -> Self
    where
        K: Into<Key> + 'static,
        V: Into<Value> + 'static,
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: 'static,
    {
        let generator: Generator = Box::new(pairs.into_iter().map(into_pair::<K, V>));
        Self::assemble(Source::one_shot(generator), true)
    }

    /// Collection from a JSON document. Arrays are keyed `0..n`, objects by
    /// their field names; any other JSON value becomes a single element.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match Value::from(json) {
            Value::Map(map) => Self::from_pairs(map.iter().map(|(k, v)| (k.clone(), v.clone()))),
            other => Self::from(vec![other]),
        }
    }

    /// Infinite, regenerable sequence `seed, f(seed), f(f(seed)), …` keyed `0, 1, 2, …`.
    ///
    /// ```
    /// use keyflow::*;
    /// # fn main() -> anyhow::Result<()> {
    /// let powers = Collection::iterate(1, |v| Value::from(v.as_i64().unwrap_or(0) * 2));
    /// assert_eq!(powers.take(4).to_json()?, serde_json::json!([1, 2, 4, 8]));
    /// # Ok(())
    /// # }
    /// ```
    pub fn iterate<S, F>(seed: S, f: F) -> Self
    where
        S: Into<Value> + 'static,
        F: Fn(&Value) -> Value + 'static,
    {
        let seed = seed.into();
        let f = Rc::new(f);
        let factory: Factory = Rc::new(move || {
            let f = Rc::clone(&f);
            Input::lazy_values(std::iter::successors(Some(seed.clone()), move |v| Some(f(v))))
        });
        Self::lazy_stage(factory, true)
    }

    /// Wrap a factory that only ever produces lazy input.
    fn lazy_stage(factory: Factory, strict_unique_keys: bool) -> Self {
        let cursor = match factory() {
            Input::Lazy(generator) => Some(Cursor::lazy(generator)),
            _ => None,
        };
        Self::assemble(Source::primed(factory, cursor), strict_unique_keys)
    }

    // ---- configuration ----

    /// Toggle duplicate-key detection on this collection.
    pub fn strict_unique_keys(&mut self, strict: bool) -> &mut Self {
        self.strict_unique_keys = strict;
        self
    }

    #[must_use]
    pub fn with_strict_unique_keys(mut self, strict: bool) -> Self {
        self.strict_unique_keys = strict;
        self
    }

    #[must_use]
    pub const fn is_strict_unique_keys(&self) -> bool {
        self.strict_unique_keys
    }

    // ---- iteration protocol ----

    /// Start a new pass.
    ///
    /// Clears the observed keys. A lazy sequence that has already been pulled
    /// is regenerated from the factory; a one-shot sequence without one fails
    /// with `SequenceConsumed`.
    ///
    /// # Errors
    /// `SequenceConsumed`, factory normalization errors, or an error raised by
    /// the first element of the sequence.
    pub fn restart(&mut self) -> Result<()> {
        self.observed_keys.clear();
        self.key_checked = false;
        let cursor = match self.cursor.take() {
            Some(cursor) if cursor.is_rewindable() => cursor,
            _ => self.source.open()?,
        };
        self.cursor.insert(cursor).start()
    }

    /// Current value; `None` before the first restart and after the end.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.cursor.as_ref().and_then(Cursor::value)
    }

    /// Current key. With strict unique keys on, a key already observed in
    /// this pass raises `DuplicateKey`.
    ///
    /// # Errors
    /// `DuplicateKey`, or an error from an adapted collection's own key check.
    pub fn key(&mut self) -> Result<Option<Key>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        let key = cursor.key()?;
        if let Some(k) = &key
            && self.strict_unique_keys
            && !self.key_checked
        {
            if !self.observed_keys.insert(k.clone()) {
                debug!("duplicate key {k} observed during a pass");
                return Err(CollectionError::DuplicateKey(k.clone()).into());
            }
            self.key_checked = true;
        }
        Ok(key)
    }

    /// Move to the next element.
    ///
    /// # Errors
    /// Whatever the underlying lazy sequence raises for the next element.
    pub fn advance(&mut self) -> Result<()> {
        self.key_checked = false;
        match self.cursor.as_mut() {
            Some(cursor) => cursor.advance(),
            None => Ok(()),
        }
    }

    /// `true` when there is no current element (including before the first restart).
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.cursor.as_ref().is_none_or(Cursor::at_end)
    }

    /// Fresh pass over `(key, value)` pairs, observing keys.
    #[must_use]
    pub fn iter(&self) -> Pairs {
        Pairs::new(self.clone())
    }

    /// Fresh pass over values only. Never raises `DuplicateKey`.
    #[must_use]
    pub fn iter_values(&self) -> Values {
        Values::new(self.clone())
    }

    // ---- pipeline construction ----

    /// New collection whose every pass runs `stage` over a fresh clone of `self`.
    pub(crate) fn pipe<F, I>(&self, stage: F) -> Self
    where
        F: Fn(Self) -> I + 'static,
        I: Iterator<Item = Result<Pair>> + 'static,
    {
        let upstream = self.clone();
        let factory: Factory =
            Rc::new(move || Input::Lazy(Box::new(stop_after_error(stage(upstream.clone())))));
        Self::lazy_stage(factory, self.strict_unique_keys)
    }

    /// Like [`pipe`](Self::pipe), but the stage needs the whole upstream at
    /// once. Realization happens on the first pull of each pass.
    pub(crate) fn pipe_eager<F>(&self, op: &'static str, realize: F) -> Self
    where
        F: Fn(&Self) -> Result<Vec<Pair>> + 'static,
    {
        let realize = Rc::new(realize);
        self.pipe(move |up| {
            let realize = Rc::clone(&realize);
            deferred(move || {
                let pairs = realize(&up)?;
                debug!("{op}: realized {} pairs", pairs.len());
                Ok(pairs)
            })
        })
    }

    /// Eager stage whose first successful realization is reused by every
    /// later pass, so random operations stay consistent across passes.
    pub(crate) fn pipe_memo<F>(&self, op: &'static str, realize: F) -> Self
    where
        F: Fn(&Self) -> Result<Vec<Pair>> + 'static,
    {
        let memo: Rc<RefCell<Option<Vec<Pair>>>> = Rc::new(RefCell::new(None));
        self.pipe_eager(op, move |up| {
            if let Some(pairs) = memo.borrow().as_ref() {
                return Ok(pairs.clone());
            }
            let pairs = realize(up)?;
            *memo.borrow_mut() = Some(pairs.clone());
            Ok(pairs)
        })
    }

    /// Stage that fails with `err` as soon as it is pulled.
    pub(crate) fn failing(&self, err: CollectionError) -> Self {
        self.pipe(move |_| std::iter::once(Err(err.clone().into())))
    }

    // ---- realization ----

    /// Realize into an ordered map. A repeated key (strict keys off) overwrites
    /// the earlier value and keeps the earlier position.
    ///
    /// # Errors
    /// `DuplicateKey` with strict keys on, or any error raised upstream.
    pub fn to_array(&self) -> Result<Map> {
        let mut out = Map::new();
        for pair in self.iter() {
            let (k, v) = pair?;
            out.insert(k, v);
        }
        Ok(out)
    }

    /// Realize every pair in order, keeping repeated keys.
    ///
    /// # Errors
    /// `DuplicateKey` with strict keys on, or any error raised upstream.
    pub fn to_pairs(&self) -> Result<Vec<Pair>> {
        self.iter().collect()
    }

    /// Realize the values in order without requesting keys.
    ///
    /// # Errors
    /// Any error raised upstream other than `DuplicateKey`.
    pub fn to_values(&self) -> Result<Vec<Value>> {
        self.iter_values().collect()
    }

    /// [`to_array`](Self::to_array) as a `Value::Map`.
    ///
    /// # Errors
    /// Same as [`to_array`](Self::to_array).
    pub fn to_value(&self) -> Result<Value> {
        Ok(Value::from(self.to_array()?))
    }

    /// [`to_array`](Self::to_array) as JSON.
    ///
    /// # Errors
    /// Same as [`to_array`](Self::to_array).
    pub fn to_json(&self) -> Result<serde_json::Value> {
        self.to_value()?.to_json()
    }

    /// Number of elements. Drives one full pass with key observation and
    /// memoizes the result.
    ///
    /// # Errors
    /// `DuplicateKey` with strict keys on, or any error raised upstream.
    pub fn count(&self) -> Result<usize> {
        if let Some(n) = self.cached_count.get() {
            return Ok(n);
        }
        let mut n = 0;
        for pair in self.iter() {
            pair?;
            n += 1;
        }
        self.cached_count.set(Some(n));
        Ok(n)
    }

    /// Whether both collections share the same source definition.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.source.ptr_eq(&other.source)
    }
}

/// A stage ends with the first error it yields.
fn stop_after_error<I>(stage: I) -> impl Iterator<Item = Result<Pair>> + 'static
where
    I: Iterator<Item = Result<Pair>> + 'static,
{
    stage.scan(false, |failed, item| {
        if *failed {
            return None;
        }
        *failed = item.is_err();
        Some(item)
    })
}

fn deferred<F>(realize: F) -> impl Iterator<Item = Result<Pair>> + 'static
where
    F: FnOnce() -> Result<Vec<Pair>> + 'static,
{
    std::iter::once_with(realize).flat_map(|batch| {
        let (pairs, err) = match batch {
            Ok(pairs) => (pairs, None),
            Err(e) => (Vec::new(), Some(e)),
        };
        pairs.into_iter().map(Ok::<Pair, anyhow::Error>).chain(err.map(Err))
    })
}

/// Iterator over `(key, value)` pairs of one pass. Fused after an error.
pub struct Pairs {
    coll: Collection,
    started: bool,
    done: bool,
}

impl Pairs {
    pub(crate) const fn new(coll: Collection) -> Self {
        Self { coll, started: false, done: false }
    }

    fn step(&mut self) -> Result<bool> {
        if self.started {
            self.coll.advance()?;
        } else {
            self.started = true;
            self.coll.restart()?;
        }
        Ok(!self.coll.at_end())
    }
}

impl Iterator for Pairs {
    type Item = Result<Pair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.step().and_then(|more| {
            if !more {
                return Ok(None);
            }
            let key = self.coll.key()?;
            Ok(key.map(|k| (k, self.coll.value().cloned().unwrap_or_default())))
        });
        match item {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterator over the values of one pass. Keys are never requested.
pub struct Values {
    inner: Pairs,
}

impl Values {
    pub(crate) const fn new(coll: Collection) -> Self {
        Self { inner: Pairs::new(coll) }
    }
}

impl Iterator for Values {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let pairs = &mut self.inner;
        if pairs.done {
            return None;
        }
        match pairs.step() {
            Ok(true) => Some(Ok(pairs.coll.value().cloned().unwrap_or_default())),
            Ok(false) => {
                pairs.done = true;
                None
            }
            Err(e) => {
                pairs.done = true;
                Some(Err(e))
            }
        }
    }
}

impl IntoIterator for Collection {
    type Item = Result<Pair>;
    type IntoIter = Pairs;

    fn into_iter(self) -> Pairs {
        Pairs::new(self)
    }
}

impl IntoIterator for &Collection {
    type Item = Result<Pair>;
    type IntoIter = Pairs;

    fn into_iter(self) -> Pairs {
        self.iter()
    }
}

impl<V: Into<Value>> From<Vec<V>> for Collection {
    fn from(values: Vec<V>) -> Self {
        values.into_iter().collect()
    }
}

impl From<Map> for Collection {
    fn from(map: Map) -> Self {
        Self::from_pairs(map)
    }
}

impl<V: Into<Value>> FromIterator<V> for Collection {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        Self::from_pairs(iter.into_iter().enumerate().map(|(i, v)| (Key::from(i), v.into())))
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map = self.to_array().map_err(S::Error::custom)?;
        serialize_map(&map, serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn protocol_walks_fixed_pairs() -> Result<()> {
        let mut c = Collection::from_pairs([("a", 1), ("b", 2)]);
        assert!(c.at_end());
        c.restart()?;
        assert_eq!(c.key()?, Some(Key::from("a")));
        assert_eq!(c.value(), Some(&Value::Int(1)));
        c.advance()?;
        assert_eq!(c.key()?, Some(Key::from("b")));
        c.advance()?;
        assert!(c.at_end());
        assert_eq!(c.value(), None);
        Ok(())
    }

    #[test]
    fn requesting_the_same_key_twice_is_not_a_duplicate() -> Result<()> {
        let mut c = Collection::from(vec![1]);
        c.restart()?;
        assert_eq!(c.key()?, c.key()?);
        Ok(())
    }

    #[test]
    fn duplicate_keys_raise_only_when_keys_are_requested() -> Result<()> {
        let c = Collection::from_pairs([(0, "a"), (0, "b")]);
        let err = c.to_array().unwrap_err();
        assert_eq!(ErrorKind::of(&err), Some(ErrorKind::DuplicateKey));
        assert_eq!(c.to_values()?.len(), 2);
        Ok(())
    }

    #[test]
    fn observed_keys_reset_between_passes() -> Result<()> {
        let c = Collection::from(vec![1, 2, 3]);
        assert_eq!(c.to_pairs()?.len(), 3);
        assert_eq!(c.to_pairs()?.len(), 3);
        Ok(())
    }

    #[test]
    fn relaxed_keys_overwrite_in_first_position() -> Result<()> {
        let c = Collection::from_pairs([(0, "a"), (1, "b"), (0, "c")]).with_strict_unique_keys(false);
        assert_eq!(c.to_json()?, json!(["c", "b"]));
        Ok(())
    }

    #[test]
    fn factory_sources_regenerate() -> Result<()> {
        let c = Collection::from_factory(|| Input::lazy_values(vec![1, 2]))?;
        assert_eq!(c.to_json()?, json!([1, 2]));
        assert_eq!(c.to_json()?, json!([1, 2]));
        Ok(())
    }

    #[test]
    fn one_shot_sources_fail_on_second_pass() {
        let c = Collection::from_generator(vec![(0, 1)]);
        assert!(c.to_pairs().is_ok());
        let err = c.to_pairs().unwrap_err();
        assert_eq!(ErrorKind::of(&err), Some(ErrorKind::SequenceConsumed));
    }

    #[test]
    fn restart_on_a_direct_generator_fails_once_consumed() -> Result<()> {
        let mut c = Collection::from_generator(vec![(0, 1)]);
        c.restart()?;
        c.advance()?;
        assert!(c.at_end());
        let err = c.restart().unwrap_err();
        assert_eq!(ErrorKind::of(&err), Some(ErrorKind::SequenceConsumed));
        Ok(())
    }

    #[test]
    fn count_is_memoized() -> Result<()> {
        let c = Collection::from(vec![1, 2, 3]);
        assert_eq!(c.count()?, 3);
        assert_eq!(c.cached_count.get(), Some(3));
        assert_eq!(c.count()?, 3);
        Ok(())
    }

    #[test]
    fn adapted_collections_do_not_share_cursors() -> Result<()> {
        let inner = Collection::from(vec![1, 2]);
        let mut outer = Collection::try_new(inner.clone())?;
        outer.restart()?;
        outer.advance()?;
        assert_eq!(inner.to_json()?, json!([1, 2]));
        assert_eq!(outer.value(), Some(&Value::Int(2)));
        Ok(())
    }

    #[test]
    fn scalar_json_becomes_a_single_element() -> Result<()> {
        assert_eq!(Collection::from_json(json!(5)).to_json()?, json!([5]));
        Ok(())
    }
}
