//! Derived operations, grouped by what they do to the pair stream.
//!
//! Each file adds an `impl Collection` block; nothing here is re-exported
//! on its own.

pub(crate) mod aggregate;
pub(crate) mod elementwise;
pub(crate) mod ordering;
pub(crate) mod structure;
