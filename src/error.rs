//! Custom error types for the command-sequence model.
//!
//! All failures in this crate are synchronous, construction-time failures:
//! a command with semantically impossible parameters is rejected before it
//! ever reaches a sequence, so a built sequence is always consistently
//! addressed. There is no partial-success state and no retry machinery;
//! anything recoverable belongs to the execution engine acting on a built
//! sequence.

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Errors raised while assembling a command sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// A command constructor was given semantically impossible parameters,
    /// e.g. a negative wait tolerance or a zero loop step.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A command was requested by position outside the valid range.
    #[error("Index {index} out of range for sequence of {len} commands")]
    IndexOutOfRange {
        /// The requested position.
        index: usize,
        /// Number of commands actually in the sequence.
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::InvalidArgument("negative tolerance -0.1".to_string());
        assert_eq!(err.to_string(), "Invalid argument: negative tolerance -0.1");
    }

    #[test]
    fn test_index_error_display() {
        let err = ScanError::IndexOutOfRange { index: 7, len: 3 };
        assert_eq!(
            err.to_string(),
            "Index 7 out of range for sequence of 3 commands"
        );
    }
}
