use thiserror::Error;

/// Failures that stop a solve before or during the Newton iterations.
///
/// Non-convergence is not among them: running out of iterations is reported
/// through [`crate::OptimumResult::succeeded`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimumError {
    #[error("invalid option: {what}")]
    InvalidOption { what: String },

    #[error("dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: String,
        actual: String,
    },

    #[error("missing problem callback: {0}")]
    MissingCallback(&'static str),

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    #[error("singular KKT system: {what}")]
    SingularKkt { what: String },

    #[error("KKT solve requested before decompose")]
    KktNotDecomposed,
}

impl OptimumError {
    pub(crate) fn vector_len(what: &'static str, expected: usize, actual: usize) -> Self {
        OptimumError::DimensionMismatch {
            what,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn matrix_shape(
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        OptimumError::DimensionMismatch {
            what,
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }

    pub(crate) fn singular(what: impl Into<String>) -> Self {
        OptimumError::SingularKkt { what: what.into() }
    }
}
