//! Testing utilities for keyflow collections.
//!
//! This module bundles what the crate's own tests use, so downstream code can
//! write the same kind of tests against its pipelines:
//!
//! - **Assertions**: compare realized collections with expected JSON, keys, or error kinds
//! - **Test data builders**: build inputs fluently, including duplicate keys and counted factories
//! - **Debug utilities**: print elements as a pass walks through a stage
//! - **Fixtures**: small record sets shared by scenario tests
//!
//! # Quick Start
//!
//! ```
//! use keyflow::*;
//! use keyflow::testing::*;
//! use serde_json::json;
//!
//! let doubled = Collection::from(vec![1, 2, 3]).map(|v, _| Value::from(v.as_i64().unwrap_or(0) * 2));
//! assert_collection_json(&doubled, json!([2, 4, 6]));
//! ```
//!
//! # Assertion Functions
//!
//! - [`assert_collection_json`]: full realization (keys included) against a JSON document
//! - [`assert_values_json`]: values only, so repeated keys never get in the way
//! - [`assert_keys`]: the key sequence of one pass
//! - [`assert_error_kind`]: the [`ErrorKind`](crate::ErrorKind) carried by a failed result
//! - [`assert_collection_size`], [`assert_all`]
//!
//! # Test Data Builders
//!
//! ```
//! use keyflow::testing::*;
//!
//! let c = TestDataBuilder::<i64>::new()
//!     .add_range(1..=3)
//!     .add_repeated(9, 2)
//!     .build_collection();
//! assert_eq!(c.count().unwrap(), 5);
//! ```
//!
//! # Debug Utilities
//!
//! ```
//! use keyflow::*;
//! use keyflow::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let out = Collection::from(vec![1, 2, 3])
//!     .debug_inspect("source")
//!     .filter(|v, _| v.as_i64().is_some_and(|n| n > 1))
//!     .debug_count("filtered")
//!     .to_values()?;
//! assert_eq!(out.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod builders;
pub mod debug;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use debug::*;
pub use fixtures::*;
