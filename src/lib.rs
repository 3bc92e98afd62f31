//! # Keyflow
//!
//! A **lazily-evaluated key/value collection pipeline** for Rust.
//! Keyflow wraps arrays, maps, lazy generators and factories behind one
//! [`Collection`] type and lets you chain transformations over it. Every
//! chained operation returns a new collection that re-reads its upstream
//! from the start, so a derived collection can be walked as many times as
//! you like.
//!
//! ## Key Features
//!
//! - **Fluent API** - chain `map`, `filter`, `index_by`, `group_by`, `sort_by` and dozens more
//! - **Lazy by default** - nothing runs until a terminal operation pulls
//! - **Key-aware** - keys flow through every stage, with duplicate-key detection
//! - **Selectors** - read fields from maps, user objects and indexable containers uniformly
//! - **Regenerable generators** - factories replay a lazy sequence on every pass
//! - **Serde integration** - build from JSON, realize to JSON
//!
//! ## Quick Start
//!
//! ```
//! use keyflow::*;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let people = Collection::from_json(json!([
//!     {"id": 1, "name": "Eddard", "age": 34},
//!     {"id": 2, "name": "Arya", "age": 9},
//!     {"id": 3, "name": "Jon", "age": 14},
//! ]));
//!
//! let names = people
//!     .filter(|p, _| p.get("age").as_i64().is_some_and(|a| a > 10))
//!     .index_by("id")
//!     .extract("name");
//!
//! assert_eq!(names.to_json()?, json!(["Eddard", "Jon"]));
//! assert_eq!(people.avg("age")?, Value::Float(19.0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Collection
//!
//! A [`Collection`] is a sequence of `(Key, Value)` pairs. It can be built from:
//! - a `Vec` of values (keyed `0..n`) or explicit pairs ([`Collection::from_pairs`])
//! - an ordered [`Map`] or a JSON document ([`Collection::from_json`])
//! - a factory producing a fresh lazy sequence per pass ([`Collection::from_factory`])
//! - a one-shot generator ([`Collection::from_generator`]), walkable once
//! - another collection, read through its own cursor
//!
//! ### Keys and values
//!
//! A [`Key`] is an integer or a string. A [`Value`] can be a scalar, a [`Map`],
//! a user [`Object`], or a nested [`Collection`].
//!
//! ### Duplicate keys
//!
//! With strict unique keys on (the default), requesting the same key twice
//! within one pass raises [`CollectionError::DuplicateKey`]. Operations that
//! only read values never request keys:
//!
//! ```
//! use keyflow::*;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let c = Collection::from_json(json!([{"k": "a"}, {"k": "a"}])).index_by("k");
//! assert_eq!(ErrorKind::of(&c.to_array().unwrap_err()), Some(ErrorKind::DuplicateKey));
//! assert_eq!(c.values().count()?, 2);
//! # Ok(())
//! # }
//! ```
//!
//! ### Selectors
//!
//! Many operations take a [`Selector`]: nothing (the value itself), a key, or a
//! function. Strings and integers convert into key selectors, so
//! `c.extract("name")` and `c.sort_by(Selector::from_fn(...))` both work.
//!
//! ## Module Overview
//!
//! - [`collection`] - the `Collection` type, its iteration protocol and realization
//! - [`source`] - input normalization and the cursor state machine
//! - [`selector`] - selector resolution over maps, objects and indexable containers
//! - [`value`] - `Key`, `Value` and the `Object`/`OffsetAccess` traits
//! - [`helpers`] - the derived operations
//! - [`extensions`] - composite transforms
//! - [`validation`] - validating constructors
//! - [`testing`] - assertions, builders, fixtures
//! - [`utils`] - natural ordering and the internal PRNG

pub mod collection;
pub mod error;
pub mod extensions;
pub mod helpers;
pub mod selector;
pub mod source;
pub mod testing;
pub mod utils;
pub mod validation;
pub mod value;

// General re-exports
pub use collection::{Collection, Pairs, Values};
pub use error::{CollectionError, ErrorKind};
pub use extensions::CompositeTransform;
pub use selector::{lookup, resolve, Extractor, Selector, Shape};
pub use source::{Factory, Generator, Input, Pair};
pub use validation::{array_collection, collection_collection};
pub use value::{Key, Map, Object, OffsetAccess, Value};
