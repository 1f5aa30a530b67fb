//! Error types for the spectral clustering pipeline.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpectralError>;

/// Coarse classification of a [`SpectralError`].
///
/// The command-line front end uses this to decide which message the user sees:
/// input problems are reported as such, everything else is an internal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Storage for a matrix or point buffer could not be obtained.
    AllocationFailure,
    /// An operation was invoked on incompatible shapes or indices.
    DimensionMismatch,
    /// Bad arguments, an unreadable or malformed input file, or a matrix the solver cannot accept.
    InvalidInput,
}

impl ErrorKind {
    /// Whether the error stems from what the user supplied rather than from the computation.
    pub fn is_user_facing(self) -> bool {
        matches!(self, ErrorKind::InvalidInput)
    }
}

/// Errors that can occur while building graphs, diagonalizing, embedding or clustering.
#[derive(Debug, Error)]
pub enum SpectralError {
    /// Storage for `elements` f64 values could not be reserved.
    #[error("Allocation failure: could not reserve storage for {elements} elements")]
    AllocationFailure {
        /// Number of elements requested
        elements: usize,
    },

    /// Shapes of the operands are incompatible for `operation`.
    #[error("Dimension mismatch in {operation}: left is {left:?}, right is {right:?}")]
    DimensionMismatch {
        /// Name of the operation that rejected its operands
        operation: &'static str,
        /// Shape of the left-hand (or destination) operand
        left: (usize, usize),
        /// Shape of the right-hand (or source) operand
        right: (usize, usize),
    },

    /// A bounds-checked access fell outside the matrix.
    #[error("Index ({row}, {col}) out of bounds for a {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Invalid argument, file or matrix.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what's wrong with the input
        message: String,
    },

    /// Reading the input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl SpectralError {
    /// Create an AllocationFailure error.
    pub fn allocation_failure(elements: usize) -> Self {
        Self::AllocationFailure { elements }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    ) -> Self {
        Self::DimensionMismatch {
            operation,
            left,
            right,
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpectralError::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            SpectralError::DimensionMismatch { .. } | SpectralError::IndexOutOfBounds { .. } => {
                ErrorKind::DimensionMismatch
            }
            SpectralError::InvalidInput { .. }
            | SpectralError::Io(_)
            | SpectralError::Config(_) => ErrorKind::InvalidInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_variants_display_and_kind() {
        let errors: Vec<(SpectralError, &str, ErrorKind)> = vec![
            (
                SpectralError::allocation_failure(1024),
                "1024 elements",
                ErrorKind::AllocationFailure,
            ),
            (
                SpectralError::dimension_mismatch("matmul", (2, 3), (4, 2)),
                "matmul",
                ErrorKind::DimensionMismatch,
            ),
            (
                SpectralError::IndexOutOfBounds {
                    row: 5,
                    col: 0,
                    rows: 2,
                    cols: 2,
                },
                "(5, 0)",
                ErrorKind::DimensionMismatch,
            ),
            (
                SpectralError::invalid_input("matrix is not symmetric"),
                "not symmetric",
                ErrorKind::InvalidInput,
            ),
            (
                SpectralError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                "gone",
                ErrorKind::InvalidInput,
            ),
        ];

        for (err, expected, kind) in errors {
            let display = err.to_string();
            assert!(
                display.contains(expected),
                "Display for {:?} should contain '{}', got: {}",
                err,
                expected,
                display
            );
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_only_invalid_input_is_user_facing() {
        assert!(ErrorKind::InvalidInput.is_user_facing());
        assert!(!ErrorKind::AllocationFailure.is_user_facing());
        assert!(!ErrorKind::DimensionMismatch.is_user_facing());
    }
}
