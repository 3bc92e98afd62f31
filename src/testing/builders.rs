//! Test data builders for creating collections fluently.

use crate::collection::Collection;
use crate::source::{Input, Pair};
use crate::value::{Key, Value};
use std::cell::Cell;
use std::ops::RangeInclusive;
use std::rc::Rc;

/// A fluent builder for creating test data.
///
/// # Example
///
/// ```
/// use keyflow::testing::TestDataBuilder;
///
/// let data = TestDataBuilder::new()
///     .add_range(1..=10)
///     .add_value(100)
///     .add_repeated(42, 5)
///     .build();
///
/// assert_eq!(data.len(), 16); // 10 + 1 + 5
/// ```
#[derive(Default)]
pub struct TestDataBuilder<T> {
    data: Vec<T>,
}

impl<T> TestDataBuilder<T> {
    /// Create a new empty test data builder.
    #[must_use]
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Add a single value to the dataset.
    #[must_use]
    pub fn add_value(mut self, value: T) -> Self {
        self.data.push(value);
        self
    }

    /// Add multiple values to the dataset.
    #[must_use]
    pub fn add_values(mut self, values: Vec<T>) -> Self {
        self.data.extend(values);
        self
    }

    /// Add a repeated value to the dataset.
    #[must_use]
    pub fn add_repeated(mut self, value: T, count: usize) -> Self
    where
        T: Clone,
    {
        self.data.extend(std::iter::repeat_n(value, count));
        self
    }

    /// Build and return the test dataset.
    #[must_use]
    pub fn build(self) -> Vec<T> {
        self.data
    }

    /// Build a fixed collection keyed `0..n`.
    #[must_use]
    pub fn build_collection(self) -> Collection
    where
        T: Into<Value>,
    {
        Collection::from(self.data)
    }

    /// Build a one-shot collection over the dataset. A second pass fails.
    #[must_use]
    pub fn build_one_shot(self) -> Collection
    where
        T: Into<Value> + 'static,
    {
        Collection::from_generator(self.data.into_iter().enumerate())
    }

    /// Get the current size of the dataset being built.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the dataset is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: From<i32>> TestDataBuilder<T> {
    /// Add a range of values to the dataset.
    ///
    /// # Example
    ///
    /// ```
    /// use keyflow::testing::TestDataBuilder;
    ///
    /// let data = TestDataBuilder::<i64>::new()
    ///     .add_range(1..=5)
    ///     .build();
    ///
    /// assert_eq!(data, vec![1, 2, 3, 4, 5]);
    /// ```
    #[must_use]
    pub fn add_range(mut self, range: RangeInclusive<i32>) -> Self {
        self.data.extend(range.map(T::from));
        self
    }
}

/// Builder for explicit `(key, value)` pairs.
///
/// Unlike a map, it keeps repeated keys, which is what duplicate-key tests need.
///
/// # Example
///
/// ```
/// use keyflow::testing::PairsBuilder;
///
/// let c = PairsBuilder::new()
///     .add_pair(0, "a")
///     .add_pair(0, "b")
///     .build_collection();
///
/// assert!(c.to_array().is_err());
/// assert_eq!(c.to_values().unwrap().len(), 2);
/// ```
#[derive(Default)]
pub struct PairsBuilder {
    data: Vec<Pair>,
}

impl PairsBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    #[must_use]
    pub fn add_pair<K: Into<Key>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.data.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn add_pairs<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.data.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn build(self) -> Vec<Pair> {
        self.data
    }

    #[must_use]
    pub fn build_collection(self) -> Collection {
        Collection::from_pairs(self.data)
    }
}

/// A factory producing a lazy sequence over `values`, plus a counter of how
/// many times it has been invoked.
///
/// # Example
///
/// ```
/// use keyflow::Collection;
/// use keyflow::testing::counting_factory;
///
/// # fn main() -> anyhow::Result<()> {
/// let (factory, calls) = counting_factory(vec![1, 2]);
/// let c = Collection::from_factory(factory)?;
/// assert_eq!(calls.get(), 1);
///
/// c.to_values()?;
/// assert_eq!(calls.get(), 1);
/// c.to_values()?;
/// assert_eq!(calls.get(), 2);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn counting_factory<V>(values: Vec<V>) -> (impl Fn() -> Input + 'static, Rc<Cell<usize>>)
where
    V: Into<Value> + Clone + 'static,
{
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let factory = move || {
        counter.set(counter.get() + 1);
        Input::lazy_values(values.clone())
    };
    (factory, calls)
}

/// Sequential integers `start..=end` as a fixed collection.
///
/// # Example
///
/// ```
/// use keyflow::testing::sequential_data;
///
/// assert_eq!(sequential_data(1, 4).count().unwrap(), 4);
/// ```
#[must_use]
pub fn sequential_data(start: i64, end: i64) -> Collection {
    (start..=end).collect()
}
