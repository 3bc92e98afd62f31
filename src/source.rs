//! Input normalization and the cursor state machine behind every collection.
//!
//! A [`Collection`] keeps two things apart:
//! - a cloneable *definition* of where its pairs come from ([`Source`]), and
//! - the *live* iteration state of the current pass ([`Cursor`]).
//!
//! Fixed data rewinds by resetting a position. Lazy generators are one-shot,
//! so a factory-backed source regenerates a fresh generator once the previous
//! one has started, while a bare generator can be walked exactly once. The
//! sequence a factory produces at construction is parked on the source and
//! handed to whichever pass opens it first.

use crate::collection::Collection;
use crate::error::CollectionError;
use crate::value::{Key, Map, Value};
use anyhow::Result;
use log::trace;
use std::cell::RefCell;
use std::rc::Rc;

/// One element of a collection.
pub type Pair = (Key, Value);

/// A single-use lazy sequence of pairs.
pub type Generator = Box<dyn Iterator<Item = Result<Pair>>>;

/// A zero-argument function producing a fresh input for every pass.
pub type Factory = Rc<dyn Fn() -> Input>;

/// Anything a collection can be built from.
pub enum Input {
    /// Fixed, ordered pairs.
    Pairs(Vec<Pair>),
    /// A one-shot lazy sequence. It cannot be regenerated.
    Lazy(Generator),
    /// A factory invoked once per pass.
    Factory(Factory),
    /// Another collection, read through its own independent cursor.
    Collection(Collection),
    /// A `Map` or `Collection` value; anything else is rejected.
    Value(Value),
}

impl Input {
    /// Lazy input from `(key, value)` pairs.
    pub fn lazy<K, V, I>(pairs: I) -> Self
    where
        K: Into<Key> + 'static,
        V: Into<Value> + 'static,
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: 'static,
    {
        Self::Lazy(Box::new(pairs.into_iter().map(into_pair::<K, V>)))
    }

    /// Lazy input from bare values, keyed `0, 1, 2, …`.
    pub fn lazy_values<V, I>(values: I) -> Self
    where
        V: Into<Value> + 'static,
        I: IntoIterator<Item = V>,
        I::IntoIter: 'static,
    {
        Self::Lazy(Box::new(values.into_iter().enumerate().map(into_pair::<usize, V>)))
    }

    const fn describe(&self) -> &'static str {
        match self {
            Self::Pairs(_) => "pairs",
            Self::Lazy(_) => "lazy sequence",
            Self::Factory(_) => "factory",
            Self::Collection(_) => "collection",
            Self::Value(_) => "value",
        }
    }
}

impl From<Value> for Input {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<Collection> for Input {
    fn from(c: Collection) -> Self {
        Self::Collection(c)
    }
}

impl From<Map> for Input {
    fn from(m: Map) -> Self {
        Self::Pairs(m.into_iter().collect())
    }
}

impl From<serde_json::Value> for Input {
    fn from(v: serde_json::Value) -> Self {
        Self::Value(Value::from(v))
    }
}

impl<V: Into<Value>> From<Vec<V>> for Input {
    fn from(values: Vec<V>) -> Self {
        Self::Pairs(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::from(i), v.into()))
                .collect(),
        )
    }
}

pub(crate) fn into_pair<K: Into<Key>, V: Into<Value>>((k, v): (K, V)) -> Result<Pair> {
    Ok((k.into(), v.into()))
}

/// Cloneable definition of a collection's pairs.
#[derive(Clone)]
pub(crate) enum Source {
    Fixed(Rc<[Pair]>),
    Factory { factory: Factory, primed: Rc<RefCell<Option<Cursor>>> },
    OneShot(Rc<RefCell<Option<Generator>>>),
    Adapted(Box<Collection>),
}

impl Source {
    pub(crate) fn empty() -> Self {
        Self::Fixed(Rc::from(Vec::new()))
    }

    pub(crate) fn one_shot(generator: Generator) -> Self {
        Self::OneShot(Rc::new(RefCell::new(Some(generator))))
    }

    /// Factory source whose first pass uses `cursor` instead of a new invocation.
    pub(crate) fn primed(factory: Factory, cursor: Option<Cursor>) -> Self {
        Self::Factory { factory, primed: Rc::new(RefCell::new(cursor)) }
    }

    /// Normalize caller-supplied input. Factories are invoked once here so
    /// that an unusable output fails at construction.
    pub(crate) fn install(input: Input) -> Result<Self> {
        match input {
            Input::Pairs(pairs) => Ok(Self::Fixed(Rc::from(pairs))),
            Input::Lazy(generator) => Ok(Self::one_shot(generator)),
            Input::Factory(factory) => {
                let cursor = Cursor::from_output(factory())?;
                Ok(Self::primed(factory, Some(cursor)))
            }
            Input::Collection(c) | Input::Value(Value::Collection(c)) => Ok(Self::Adapted(Box::new(c))),
            Input::Value(Value::Map(map)) => {
                Ok(Self::Fixed(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()))
            }
            Input::Value(other) => Err(CollectionError::invalid_argument(format!(
                "cannot build a collection from a {} value",
                other.type_name()
            ))),
        }
    }

    /// Open a cursor for a new pass.
    pub(crate) fn open(&self) -> Result<Cursor> {
        match self {
            Self::Fixed(pairs) => Ok(Cursor::Fixed { pairs: Rc::clone(pairs), pos: 0 }),
            Self::Factory { factory, primed } => {
                if let Some(cursor) = primed.borrow_mut().take() {
                    return Ok(cursor);
                }
                trace!("regenerating lazy sequence from its factory");
                Cursor::from_output(factory())
            }
            Self::OneShot(cell) => {
                let generator = cell.borrow_mut().take().ok_or(CollectionError::SequenceConsumed)?;
                trace!("opening one-shot lazy sequence");
                Ok(Cursor::lazy(generator))
            }
            Self::Adapted(inner) => Ok(Cursor::Adapter(Box::new((**inner).clone()))),
        }
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => Rc::ptr_eq(a, b),
            (Self::Factory { factory: a, .. }, Self::Factory { factory: b, .. }) => Rc::ptr_eq(a, b),
            (Self::OneShot(a), Self::OneShot(b)) => Rc::ptr_eq(a, b),
            (Self::Adapted(a), Self::Adapted(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Self::Fixed(_) => "fixed",
            Self::Factory { .. } => "factory",
            Self::OneShot(_) => "one-shot",
            Self::Adapted(_) => "adapted",
        }
    }
}

/// Progress of a lazy generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Not pulled yet; can be started without regenerating.
    Fresh,
    Running,
    Done,
}

/// Live iteration state of one pass.
pub(crate) enum Cursor {
    Fixed { pairs: Rc<[Pair]>, pos: usize },
    Lazy { generator: Generator, current: Option<Box<Pair>>, phase: Phase },
    Adapter(Box<Collection>),
}

impl Cursor {
    pub(crate) fn lazy(generator: Generator) -> Self {
        Self::Lazy { generator, current: None, phase: Phase::Fresh }
    }

    /// Normalize what a factory produced.
    fn from_output(output: Input) -> Result<Self> {
        match output {
            Input::Pairs(pairs) => Ok(Self::Fixed { pairs: Rc::from(pairs), pos: 0 }),
            Input::Lazy(generator) => Ok(Self::lazy(generator)),
            Input::Collection(c) | Input::Value(Value::Collection(c)) => Ok(Self::Adapter(Box::new(c))),
            Input::Value(Value::Map(map)) => Ok(Self::Fixed {
                pairs: map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                pos: 0,
            }),
            Input::Value(other) => Err(CollectionError::invalid_return_value(format!(
                "factory returned a {} value",
                other.type_name()
            ))),
            other @ Input::Factory(_) => Err(CollectionError::invalid_return_value(format!(
                "factory returned a {}",
                other.describe()
            ))),
        }
    }

    /// Whether this cursor can start another pass without being reopened.
    pub(crate) const fn is_rewindable(&self) -> bool {
        !matches!(self, Self::Lazy { phase: Phase::Running | Phase::Done, .. })
    }

    /// Position on the first element.
    pub(crate) fn start(&mut self) -> Result<()> {
        match self {
            Self::Fixed { pos, .. } => {
                *pos = 0;
                Ok(())
            }
            Self::Lazy { phase: Phase::Fresh, .. } => self.advance(),
            Self::Lazy { .. } => Ok(()),
            Self::Adapter(inner) => inner.restart(),
        }
    }

    pub(crate) fn advance(&mut self) -> Result<()> {
        match self {
            Self::Fixed { pairs, pos } => {
                if *pos < pairs.len() {
                    *pos += 1;
                }
                Ok(())
            }
            Self::Lazy { generator, current, phase } => {
                if *phase == Phase::Done {
                    return Ok(());
                }
                match generator.next() {
                    Some(Ok(pair)) => {
                        *current = Some(Box::new(pair));
                        *phase = Phase::Running;
                        Ok(())
                    }
                    Some(Err(e)) => {
                        *current = None;
                        *phase = Phase::Done;
                        Err(e)
                    }
                    None => {
                        *current = None;
                        *phase = Phase::Done;
                        Ok(())
                    }
                }
            }
            Self::Adapter(inner) => inner.advance(),
        }
    }

    pub(crate) fn value(&self) -> Option<&Value> {
        match self {
            Self::Fixed { pairs, pos } => pairs.get(*pos).map(|(_, v)| v),
            Self::Lazy { current, .. } => current.as_deref().map(|(_, v)| v),
            Self::Adapter(inner) => inner.value(),
        }
    }

    /// Current key without duplicate tracking at this level.
    pub(crate) fn key(&mut self) -> Result<Option<Key>> {
        match self {
            Self::Fixed { pairs, pos } => Ok(pairs.get(*pos).map(|(k, _)| k.clone())),
            Self::Lazy { current, .. } => Ok(current.as_deref().map(|(k, _)| k.clone())),
            Self::Adapter(inner) => inner.key(),
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        match self {
            Self::Fixed { pairs, pos } => *pos >= pairs.len(),
            Self::Lazy { current, phase, .. } => *phase != Phase::Running || current.is_none(),
            Self::Adapter(inner) => inner.at_end(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn fixed_cursor_walks_and_rewinds() -> Result<()> {
        let source = Source::install(Input::from(vec![1, 2]))?;
        let mut c = source.open()?;
        c.start()?;
        assert_eq!(c.value(), Some(&Value::Int(1)));
        c.advance()?;
        c.advance()?;
        assert!(c.at_end());
        assert!(c.is_rewindable());
        c.start()?;
        assert_eq!(c.key()?, Some(Key::Int(0)));
        Ok(())
    }

    #[test]
    fn one_shot_source_opens_once() -> Result<()> {
        let source = Source::install(Input::lazy_values(vec![1]))?;
        let mut c = source.open()?;
        c.start()?;
        assert_eq!(c.value(), Some(&Value::Int(1)));
        assert!(!c.is_rewindable());
        let err = source.open().err().map(|e| ErrorKind::of(&e));
        assert_eq!(err, Some(Some(ErrorKind::SequenceConsumed)));
        Ok(())
    }

    #[test]
    fn factory_output_is_validated() {
        let factory: Factory = Rc::new(|| Input::Value(Value::Int(3)));
        let err = Source::install(Input::Factory(factory)).err();
        assert_eq!(err.as_ref().and_then(ErrorKind::of), Some(ErrorKind::InvalidReturnValue));

        let nested: Factory = Rc::new(|| Input::Factory(Rc::new(|| Input::Pairs(Vec::new()))));
        let err = Source::install(Input::Factory(nested)).err();
        assert_eq!(err.as_ref().and_then(ErrorKind::of), Some(ErrorKind::InvalidReturnValue));
    }

    #[test]
    fn primed_cursor_is_used_once() -> Result<()> {
        let calls = Rc::new(std::cell::Cell::new(0));
        let counter = Rc::clone(&calls);
        let factory: Factory = Rc::new(move || {
            counter.set(counter.get() + 1);
            Input::lazy_values(vec![1, 2])
        });
        let source = Source::install(Input::Factory(factory))?;
        assert_eq!(calls.get(), 1);

        let shared = source.clone();
        let mut first = shared.open()?;
        first.start()?;
        assert_eq!(first.value(), Some(&Value::Int(1)));
        assert_eq!(calls.get(), 1);

        source.open()?;
        assert_eq!(calls.get(), 2);
        Ok(())
    }

    #[test]
    fn scalar_input_is_an_invalid_argument() {
        let err = Source::install(Input::Value(Value::from("nope"))).err();
        assert_eq!(err.as_ref().and_then(ErrorKind::of), Some(ErrorKind::InvalidArgument));
    }
}
