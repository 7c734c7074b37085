//! ID validation failures.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("id is empty")]
    Empty,

    #[error("id is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },

    /// Whitespace or a control character inside a caller-supplied name.
    #[error("id has {found:?} at byte {index}")]
    InvalidCharacter { found: char, index: usize },

    /// A generated ID carried another record type's prefix.
    #[error("expected `{expected}_` prefix, found `{actual}`")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    #[error("generated id has no `_` separator")]
    MissingSeparator,

    #[error("bad ulid: {0}")]
    InvalidUlid(String),
}
