//! Centralized error handling for Srx.
//!
//! Every failure an archive can produce is represented as a value of
//! [`SrxError`]; the library never panics on malformed input or schema
//! mismatches (enforced by `#![deny(clippy::panic)]` and
//! `#![deny(clippy::unwrap_used)]`).
//!
//! ## Error Categories
//!
//! Errors are grouped by the phase that raises them:
//!
//! - **Format errors** ([`SrxError::Format`]): the decoder rejected the byte
//!   stream (bad magic, malformed blob size, premature end, missing root).
//! - **Schema errors** ([`SrxError::VersionIncompatible`],
//!   [`SrxError::TypeMismatch`], [`SrxError::MemberMissing`],
//!   [`SrxError::MissingRoot`]): the synchronizer could not reconcile the
//!   decoded graph with the live destination graph.
//! - **Value errors** ([`SrxError::Value`]): a value accessor or mutator was
//!   applied to an object of the wrong kind.
//! - **Internal errors** ([`SrxError::Internal`]): logic errors in the
//!   library itself. These should not occur in production; please report
//!   them with a reproduction case.
//!
//! Schema errors carry both sides of the mismatch so callers can present
//! actionable messages.
//!
//! ## Usage
//!
//! ```rust
//! use srx::{Archive, SrxError};
//!
//! match Archive::from_bytes(b"not an archive") {
//!     Ok(_) => unreachable!(),
//!     Err(SrxError::Format(msg)) => assert!(msg.contains("magic")),
//!     Err(e) => panic!("unexpected error: {e}"),
//! }
//! ```

use std::fmt;

use crate::dtype::DataType;
use crate::object::Version;

/// A specialized `Result` type for Srx operations.
pub type Result<T> = std::result::Result<T, SrxError>;

/// Which of the two graphs taking part in a sync an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The decoded graph the values are read from.
    Source,
    /// The live graph being mutated.
    Destination,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Destination => write!(f, "destination"),
        }
    }
}

/// The master error enum covering all failure domains in Srx.
#[derive(Debug, Clone, PartialEq)]
pub enum SrxError {
    /// The byte stream does not conform to the `Srx1v` wire format.
    Format(String),

    /// The schema versions of two corresponding objects rule each other out.
    ///
    /// Two objects are compatible when their versions are equal, or when the
    /// newer side's minimum compatible version does not exceed the older
    /// side's version.
    VersionIncompatible {
        /// Version declared by the live destination object.
        dst_version: Version,
        /// Minimum version the destination is still compatible with.
        dst_min_version: Version,
        /// Version the source object was encoded with.
        src_version: Version,
        /// Minimum version the source is still compatible with.
        src_min_version: Version,
    },

    /// Two corresponding objects have structurally different data types.
    TypeMismatch {
        /// Type descriptor of the live destination object.
        dst: DataType,
        /// Type descriptor of the decoded source object.
        src: DataType,
    },

    /// One side of a sync has no root object.
    MissingRoot(Side),

    /// A source member could not be bound to any destination member.
    ///
    /// Carries the name of the unmatched source member.
    MemberMissing(String),

    /// A value accessor or mutator was applied to an unsuitable object,
    /// for example `set_int_value` on a floating point datum.
    Value(String),

    /// Logic error in the library. Indicates a bug in Srx, not in the
    /// caller's data.
    Internal(String),
}

impl fmt::Display for SrxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(msg) => write!(f, "decode error: {msg}"),
            Self::VersionIncompatible {
                dst_version,
                dst_min_version,
                src_version,
                src_min_version,
            } => write!(
                f,
                "version incompatible (destination version {dst_version} \
                 [min. version {dst_min_version}], source version {src_version} \
                 [min. version {src_min_version}])"
            ),
            Self::TypeMismatch { dst, src } => write!(
                f,
                "incompatible data structure type (destination type {dst} \
                 vs. source type {src})"
            ),
            Self::MissingRoot(side) => write!(f, "no {side} root object"),
            Self::MemberMissing(name) => {
                write!(f, "expected member '{name}' missing in destination object")
            }
            Self::Value(msg) => write!(f, "value error: {msg}"),
            Self::Internal(msg) => write!(f, "internal logic error: {msg}"),
        }
    }
}

impl std::error::Error for SrxError {}
