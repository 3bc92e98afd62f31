//! Utility types and functions for keyflow.

use crate::value::Value;
use ordered_float::OrderedFloat;
use std::cell::Cell;
use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

/// Rank of a value's kind in the natural ordering.
const fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Str(_) => 3,
        Value::Map(_) => 4,
        Value::Object(_) => 5,
        Value::Collection(_) => 6,
    }
}

/// Natural ordering of two values.
///
/// Numbers compare numerically across `Int` and `Float`, strings
/// lexicographically, maps by length and then element by element. Values of
/// different kinds order as `Null < Bool < number < Str < Map < Object <
/// Collection`. Objects and collections are unordered among themselves.
#[must_use]
pub fn natural_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let x = OrderedFloat(a.as_f64().unwrap_or_default());
            let y = OrderedFloat(b.as_f64().unwrap_or_default());
            x.cmp(&y)
        }
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (Value::Map(x), Value::Map(y)) => x.len().cmp(&y.len()).then_with(|| {
            x.values()
                .zip(y.values())
                .map(|(l, r)| natural_cmp(l, r))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// A wrapper around [`Value`] that implements `Ord` with [`natural_cmp`].
///
/// This allows values to be used as `BTreeMap` keys or sorted with the
/// standard library's `Ord`-based helpers.
///
/// # Examples
///
/// ```
/// use keyflow::utils::OrdValue;
/// use keyflow::Value;
///
/// let mut v = vec![OrdValue(Value::from(3)), OrdValue(Value::from(1.5)), OrdValue(Value::Null)];
/// v.sort();
/// assert_eq!(v[0].0, Value::Null);
/// assert_eq!(v[1].0, Value::from(1.5));
/// ```
#[derive(Clone, Debug)]
pub struct OrdValue(pub Value);

impl PartialEq for OrdValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrdValue {}

impl PartialOrd for OrdValue {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdValue {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0)
    }
}

impl From<Value> for OrdValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<OrdValue> for Value {
    fn from(value: OrdValue) -> Self {
        value.0
    }
}

thread_local! {
    static SEED_COUNTER: Cell<u64> = const { Cell::new(0) };
}

/// Tiny `SplitMix64` PRNG used by `shuffle` and `random`.
#[derive(Clone, Copy, Debug)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the clock, mixed with a per-thread counter so two generators
    /// created in the same instant still diverge.
    #[must_use]
    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let bump = SEED_COUNTER.with(|c| {
            let n = c.get().wrapping_add(1);
            c.set(n);
            n
        });
        #[allow(clippy::cast_possible_truncation)]
        let seed = (nanos as u64) ^ bump.wrapping_mul(0xA24B_AED4_0B9C_497C);
        Self::new(seed)
    }

    #[inline]
    pub const fn next_u64(&mut self) -> u64 {
        let mut z = {
            self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            self.state
        };
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform index in `0..bound`. `bound` must be non-zero.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }

    /// In-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }

    /// `n` distinct indices out of `0..len`, in ascending order.
    pub fn sample_indices(&mut self, len: usize, n: usize) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..len).collect();
        for i in 0..n.min(len) {
            let j = i + self.below(len - i);
            idx.swap(i, j);
        }
        idx.truncate(n.min(len));
        idx.sort_unstable();
        idx
    }
}
