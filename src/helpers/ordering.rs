//! Reordering: sorting, shuffling and random selection.
//!
//! All of these realize the upstream when their result is first read. Sorts
//! are stable and break ties on the original key, so equal values keep a
//! deterministic order.
//!
//! ## Example
//! ```
//! use keyflow::*;
//! use serde_json::json;
//!
//! let c = Collection::from_json(json!({"b": 2, "a": 3, "c": 1}));
//! assert_eq!(c.sort().keys().to_json()?, json!(["c", "b", "a"]));
//! assert_eq!(c.sort_by_keys().values().to_json()?, json!([3, 2, 1]));
//! # anyhow::Result::<()>::Ok(())
//! ```

use crate::collection::Collection;
use crate::error::CollectionError;
use crate::selector::{resolve, Selector};
use crate::source::Pair;
use crate::utils::{natural_cmp, SplitMix64};
use crate::value::Value;
use anyhow::Result;
use std::cmp::Ordering;

fn sorted_by<F>(mut pairs: Vec<Pair>, mut cmp: F) -> Vec<Pair>
where
    F: FnMut(&Pair, &Pair) -> Ordering,
{
    pairs.sort_by(|a, b| cmp(a, b).then_with(|| a.0.cmp(&b.0)));
    pairs
}

impl Collection {
    /// Sort by the natural order of the values, keys preserved.
    #[must_use]
    pub fn sort(&self) -> Self {
        self.pipe_eager("sort", |up| {
            Ok(sorted_by(up.to_pairs()?, |a, b| natural_cmp(&a.1, &b.1)))
        })
    }

    /// Sort with a custom comparator over values, keys preserved.
    pub fn sort_with<F>(&self, cmp: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + 'static,
    {
        self.pipe_eager("sort_with", move |up| {
            Ok(sorted_by(up.to_pairs()?, |a, b| cmp(&a.1, &b.1)))
        })
    }

    /// Sort by what `selector` reads from every value.
    pub fn sort_by<S: Into<Selector>>(&self, selector: S) -> Self {
        let ex = resolve(&selector.into());
        self.pipe_eager("sort_by", move |up| {
            let mut keyed: Vec<(Value, Pair)> = up
                .to_pairs()?
                .into_iter()
                .map(|pair| Ok((ex(&pair.1)?, pair)))
                .collect::<Result<_>>()?;
            keyed.sort_by(|(a, pa), (b, pb)| natural_cmp(a, b).then_with(|| pa.0.cmp(&pb.0)));
            Ok(keyed.into_iter().map(|(_, pair)| pair).collect())
        })
    }

    /// Sort by key.
    #[must_use]
    pub fn sort_by_keys(&self) -> Self {
        self.pipe_eager("sort_by_keys", |up| Ok(sorted_by(up.to_pairs()?, |_, _| Ordering::Equal)))
    }

    /// Random order, keys preserved. Every pass of the result sees the same order.
    #[must_use]
    pub fn shuffle(&self) -> Self {
        self.pipe_memo("shuffle", |up| {
            let mut pairs = up.to_pairs()?;
            SplitMix64::from_entropy().shuffle(&mut pairs);
            Ok(pairs)
        })
    }

    /// `n` distinct random elements, in their original order.
    ///
    /// Fails with `InvalidArgument` when `n` is zero or larger than the
    /// collection. Every pass of the result sees the same selection.
    #[must_use]
    pub fn random(&self, n: usize) -> Self {
        self.pipe_memo("random", move |up| {
            let pairs = up.to_pairs()?;
            if n == 0 || n > pairs.len() {
                return Err(CollectionError::invalid_argument(format!(
                    "cannot pick {n} random elements out of {}",
                    pairs.len()
                )));
            }
            let picked = SplitMix64::from_entropy().sample_indices(pairs.len(), n);
            Ok(picked.into_iter().map(|i| pairs[i].clone()).collect())
        })
    }
}
