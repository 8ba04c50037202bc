//! Error taxonomy shared by the kernel, the trajectory and the controller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

/// Every failure a demo can report back to its widget.
///
/// None of these are retried; the trajectory is left untouched and the caller
/// decides what to display instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DemoError {
    /// Two operands (or an operand and an expected shape) disagree in length.
    #[error("{operation}: dimension mismatch ({left} vs {right})")]
    DimensionMismatch {
        operation: &'static str,
        left: usize,
        right: usize,
    },

    /// A statistic needs non-zero spread or magnitude and did not get it.
    #[error("{operation} is not computable: {reason}")]
    NotComputable {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("invalid hyperparameter `{name}` = {value}: {reason}")]
    InvalidHyperparameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("a run is already in progress; pause it first")]
    RunInProgress,

    #[error("input sequence of length {length} is exhausted")]
    SequenceExhausted { length: usize },
}

impl DemoError {
    pub(crate) fn mismatch(operation: &'static str, left: usize, right: usize) -> Self {
        DemoError::DimensionMismatch {
            operation,
            left,
            right,
        }
    }

    pub(crate) fn not_computable(operation: &'static str, reason: &'static str) -> Self {
        DemoError::NotComputable { operation, reason }
    }

    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        DemoError::InvalidHyperparameter {
            name,
            value,
            reason,
        }
    }
}
