//! Error kinds raised by collections.
//!
//! Every fallible operation in this crate returns [`anyhow::Result`]. The error
//! carried inside is always a [`CollectionError`], so callers that need to react
//! to a specific failure can downcast:
//!
//! ```
//! use keyflow::*;
//!
//! let indexed = Collection::from_json(serde_json::json!([{"id": 1}, {"id": 1}]))
//!     .index_by("id");
//!
//! let err = indexed.to_array().unwrap_err();
//! assert_eq!(ErrorKind::of(&err), Some(ErrorKind::DuplicateKey));
//! ```
//!
//! None of these errors are retried internally. The usual recovery for
//! [`CollectionError::DuplicateKey`] is to call
//! [`values`](crate::Collection::values) or disable strict key checking with
//! [`strict_unique_keys(false)`](crate::Collection::strict_unique_keys).

use crate::value::Key;
use std::fmt;

/// A tagged collection error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// The input handed to a collection (or an operation argument) is unusable.
    InvalidArgument(String),
    /// A factory, selector, or callback produced a value the caller cannot use.
    InvalidReturnValue(String),
    /// A key was observed twice during one pass while strict keys were enabled.
    DuplicateKey(Key),
    /// The operation needs at least one element.
    EmptyCollection(String),
    /// A validating collection received an item of the wrong shape.
    InvalidType(String),
    /// A one-shot lazy sequence without a factory was asked for another pass.
    SequenceConsumed,
}

/// Discriminant of [`CollectionError`], handy for assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidReturnValue,
    DuplicateKey,
    EmptyCollection,
    InvalidType,
    SequenceConsumed,
}

impl CollectionError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::InvalidReturnValue(_) => ErrorKind::InvalidReturnValue,
            Self::DuplicateKey(_) => ErrorKind::DuplicateKey,
            Self::EmptyCollection(_) => ErrorKind::EmptyCollection,
            Self::InvalidType(_) => ErrorKind::InvalidType,
            Self::SequenceConsumed => ErrorKind::SequenceConsumed,
        }
    }

    pub(crate) fn invalid_argument<S: Into<String>>(message: S) -> anyhow::Error {
        Self::InvalidArgument(message.into()).into()
    }

    pub(crate) fn invalid_return_value<S: Into<String>>(message: S) -> anyhow::Error {
        Self::InvalidReturnValue(message.into()).into()
    }

    pub(crate) fn empty<S: Into<String>>(operation: S) -> anyhow::Error {
        Self::EmptyCollection(operation.into()).into()
    }
}

impl ErrorKind {
    /// Kind of the [`CollectionError`] inside `err`, if there is one.
    #[must_use]
    pub fn of(err: &anyhow::Error) -> Option<Self> {
        err.downcast_ref::<CollectionError>().map(CollectionError::kind)
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::InvalidReturnValue(msg) => write!(f, "invalid return value: {msg}"),
            Self::DuplicateKey(key) => write!(
                f,
                "duplicate key {key}: either call values() or strict_unique_keys(false) before you act on the collection"
            ),
            Self::EmptyCollection(op) => write!(f, "cannot compute {op} of an empty collection"),
            Self::InvalidType(msg) => write!(f, "invalid type: {msg}"),
            Self::SequenceConsumed => {
                write!(f, "lazy sequence was already consumed and has no factory to regenerate it")
            }
        }
    }
}

impl std::error::Error for CollectionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_survives_anyhow_wrapping() {
        let err: anyhow::Error = CollectionError::DuplicateKey(Key::Int(3)).into();
        assert_eq!(ErrorKind::of(&err), Some(ErrorKind::DuplicateKey));
        assert!(err.to_string().contains("duplicate key 3"));
    }

    #[test]
    fn foreign_errors_have_no_kind() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(ErrorKind::of(&err), None);
    }
}
