//! Common result and error types for the legalizer.

/// The standard result type for fallible internal operations.
///
/// `Ok` contains the result value, which may describe a partially legal
/// placement after recoverable failures. `Err` indicates a violated grid
/// invariant (a bug in the legalizer or its caller), not a design problem.
/// Design problems are reported through the diagnostic sink and the
/// operation still returns `Ok`.
pub type DplResult<T> = Result<T, InternalError>;

/// An internal error indicating a broken invariant, not a user input problem.
///
/// These errors should never occur during normal operation. Painting a cell
/// over an already-occupied pixel is the canonical example.
#[derive(Debug, thiserror::Error)]
#[error("internal legalizer error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
