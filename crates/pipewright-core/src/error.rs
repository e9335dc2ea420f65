//! Error types for Pipewright.
//!
//! A handler chain only fails when it was assembled incorrectly. Both
//! failures are programmer errors in how combinators were composed and are
//! surfaced as a failure of the single request being processed:
//!
//! | Error | Raised when |
//! |---|---|
//! | [`ChainError::Unbuffered`] | A buffered post-step runs without buffering enabled upstream |
//! | [`ChainError::NotCancelable`] | A root-cancel pre-step runs without root cancellation enabled upstream |
//!
//! Cancellation itself is never an error.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`ChainError`].
pub type ChainResult<T> = Result<T, ChainError>;

/// Configuration errors raised while a chain processes a request.
///
/// Variants carry no data so callers can compare them by identity.
///
/// # Example
///
/// ```
/// use pipewright_core::{ChainError, ERR_UNBUFFERED};
///
/// let err = ChainError::Unbuffered;
/// assert_eq!(err, ERR_UNBUFFERED);
/// assert_eq!(err.to_string(), "buffered response body required");
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainError {
    /// A step needed the written response body, but the sink was not buffered.
    #[error("buffered response body required")]
    Unbuffered,

    /// A step needed to cancel the whole chain, but no root trigger was attached.
    #[error("root request has to be cancelable")]
    NotCancelable,
}

impl ChainError {
    /// Returns the HTTP status code a response is marked with for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unbuffered | Self::NotCancelable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a stable machine-readable code for error envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unbuffered => "UNBUFFERED",
            Self::NotCancelable => "NOT_CANCELABLE",
        }
    }
}

/// A buffered post-step was used without buffering enabled upstream.
pub const ERR_UNBUFFERED: ChainError = ChainError::Unbuffered;

/// A root-cancel pre-step was used without root cancellation enabled upstream.
pub const ERR_NOTCANCELABLE: ChainError = ChainError::NotCancelable;
