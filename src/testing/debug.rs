//! Debug utilities for inspecting collections during test execution.
//!
//! This module provides an extension trait that adds pass-through debugging
//! stages to [`Collection`]. They print to stderr, which the test harness
//! captures unless `--nocapture` is given.

use crate::collection::{Collection, Pairs};
use crate::source::Pair;
use crate::value::{Key, Value};
use anyhow::Result;
use std::cell::Cell;
use std::rc::Rc;

/// Extension trait for adding debug stages to [`Collection`].
///
/// Every method returns a new lazy stage that yields exactly what its
/// upstream yields.
pub trait CollectionDebugExt {
    /// Print every pair as a pass walks through this point.
    ///
    /// # Example
    ///
    /// ```
    /// use keyflow::*;
    /// use keyflow::testing::CollectionDebugExt;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let out = Collection::from(vec![1, 2])
    ///     .debug_inspect("after source")
    ///     .to_values()?;
    /// assert_eq!(out, vec![Value::Int(1), Value::Int(2)]);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    fn debug_inspect(&self, label: &str) -> Collection;

    /// Like [`debug_inspect`](Self::debug_inspect) with a custom inspector.
    #[must_use]
    fn debug_inspect_with<F>(&self, label: &str, inspector: F) -> Collection
    where
        F: Fn(&Key, &Value) + 'static;

    /// Print how many pairs each pass yielded once it ends.
    #[must_use]
    fn debug_count(&self, label: &str) -> Collection;
}

impl CollectionDebugExt for Collection {
    fn debug_inspect(&self, label: &str) -> Collection {
        let label: Rc<str> = Rc::from(label);
        self.each(move |v, k| eprintln!("[Debug: {label}] {k} => {v:?}"))
    }

    fn debug_inspect_with<F>(&self, label: &str, inspector: F) -> Collection
    where
        F: Fn(&Key, &Value) + 'static,
    {
        let label: Rc<str> = Rc::from(label);
        self.each(move |v, k| {
            eprint!("[Debug: {label}] ");
            inspector(k, v);
        })
    }

    fn debug_count(&self, label: &str) -> Collection {
        let label: Rc<str> = Rc::from(label);
        self.pipe(move |up| {
            let seen = Rc::new(Cell::new(0_usize));
            let counter = Rc::clone(&seen);
            let label = Rc::clone(&label);
            Pairs::new(up)
                .inspect(move |item| {
                    if item.is_ok() {
                        counter.set(counter.get() + 1);
                    }
                })
                .chain(
                    std::iter::once_with(move || {
                        eprintln!("[Debug: {label}] pass yielded {} pairs", seen.get());
                    })
                    .filter_map(|()| None::<Result<Pair>>),
                )
        })
    }
}
