//! Error types for buffer and format operations.

use std::fmt;

/// Result type alias for textcore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for textcore operations.
///
/// Every mutator validates its arguments before touching the buffer, so an
/// error leaves the buffer as it was (apart from edits made by change hooks).
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Position or range outside the buffer or its accessible portion.
    ArgsOutOfRange { start: i64, end: i64 },
    /// Argument has the wrong shape.
    WrongType {
        expected: &'static str,
        got: String,
    },
    /// A size computation exceeded what can be represented.
    Overflow(&'static str),
    /// The buffer is read-only.
    BufferReadOnly(String),
    /// Text at this position carries a non-nil `read-only` property.
    TextReadOnly(usize),
    /// The two regions passed to a transposition overlap.
    TransposedRegionsOverlap,
    /// Motion hit the start of the accessible portion.
    BeginningOfBuffer,
    /// Motion hit the end of the accessible portion.
    EndOfBuffer,
    /// The buffer was killed.
    DeadBuffer,
    /// The marker does not point anywhere.
    DetachedMarker,
    /// Malformed format string or argument mismatch.
    Format(String),
    /// A change hook signalled.
    Hook(String),
}

impl Error {
    /// Range error for a single position.
    #[must_use]
    pub fn out_of_range(pos: usize) -> Self {
        Self::ArgsOutOfRange {
            start: pos as i64,
            end: pos as i64,
        }
    }

    /// Range error for a region.
    #[must_use]
    pub fn region_out_of_range(start: usize, end: usize) -> Self {
        Self::ArgsOutOfRange {
            start: start as i64,
            end: end as i64,
        }
    }

    pub(crate) fn wrong_type(expected: &'static str, got: impl fmt::Debug) -> Self {
        Self::WrongType {
            expected,
            got: format!("{got:?}"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArgsOutOfRange { start, end } if start == end => {
                write!(f, "args out of range: {start}")
            }
            Self::ArgsOutOfRange { start, end } => write!(f, "args out of range: {start}, {end}"),
            Self::WrongType { expected, got } => write!(f, "wrong type argument: {expected}, {got}"),
            Self::Overflow(what) => write!(f, "overflow error: {what}"),
            Self::BufferReadOnly(name) => write!(f, "buffer is read-only: {name}"),
            Self::TextReadOnly(pos) => write!(f, "text is read-only at {pos}"),
            Self::TransposedRegionsOverlap => write!(f, "transposed regions overlap"),
            Self::BeginningOfBuffer => write!(f, "beginning of buffer"),
            Self::EndOfBuffer => write!(f, "end of buffer"),
            Self::DeadBuffer => write!(f, "selecting deleted buffer"),
            Self::DetachedMarker => write!(f, "marker does not point anywhere"),
            Self::Format(msg) => write!(f, "{msg}"),
            Self::Hook(msg) => write!(f, "change hook failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
