//! Error types for the projection kernels.

use thiserror::Error;

/// Errors that can occur during a projection or minimization call.
///
/// `Infeasible` is a property of the caller's input and is recoverable.
/// `InvariantViolation` means a post-condition or iteration bound failed;
/// the computation that raised it must be abandoned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Malformed argument (NaN input, bad selection, non-positive weight, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Vector lengths disagree
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// The constraint set is empty
    #[error("Infeasible: lower bounds sum to {lower_sum} but target is {target}")]
    Infeasible {
        /// Sum of the lower bounds over the selection
        lower_sum: f64,
        /// Requested target sum or capacity
        target: f64,
    },

    /// Internal consistency check failed
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl ProjectionError {
    /// True for the recoverable "no solution exists" class.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, ProjectionError::Infeasible { .. })
    }

    /// True for post-condition / iteration-bound failures.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, ProjectionError::InvariantViolation(_))
    }
}

/// Result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes_are_disjoint() {
        let inf = ProjectionError::Infeasible { lower_sum: 3.0, target: 2.0 };
        let inv = ProjectionError::InvariantViolation("sum drifted".into());

        assert!(inf.is_infeasible());
        assert!(!inf.is_invariant_violation());
        assert!(inv.is_invariant_violation());
        assert!(!inv.is_infeasible());
    }

    #[test]
    fn test_error_messages() {
        let err = ProjectionError::DimensionMismatch { expected: 4, actual: 3 };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 4, got 3");

        let err = ProjectionError::Infeasible { lower_sum: 3.0, target: 2.0 };
        assert_eq!(
            err.to_string(),
            "Infeasible: lower bounds sum to 3 but target is 2"
        );
    }
}
