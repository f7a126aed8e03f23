use thiserror::Error;

/// Error types for the welltest library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WellTestError {
    /// Error indicating a mismatch in array or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for invalid parameter values (missing, non-positive, out of range).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error for observed data that cannot be fitted (empty or misaligned arrays).
    #[error("Malformed observed data: {0}")]
    MalformedObservedData(String),

    /// The forward model produced a non-finite value for this parameter set.
    ///
    /// This is recoverable: the optimizer treats the offending trial step as
    /// failed and continues from the last accepted state.
    #[error("Infeasible model evaluation: {0}")]
    InfeasibleEvaluation(String),

    /// Error indicating a singular normal-equations matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error indicating the optimization failed to make progress.
    #[error("Convergence failure: {0}")]
    ConvergenceFailure(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for welltest operations.
pub type Result<T> = std::result::Result<T, WellTestError>;

impl From<String> for WellTestError {
    fn from(s: String) -> Self {
        WellTestError::Other(s)
    }
}

impl From<&str> for WellTestError {
    fn from(s: &str) -> Self {
        WellTestError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WellTestError::DimensionMismatch("expected 5 residuals, got 3".to_string());
        assert!(format!("{}", err).contains("expected 5 residuals, got 3"));

        let err = WellTestError::InfeasibleEvaluation("pD is NaN at tD=1e-3".to_string());
        assert!(format!("{}", err).contains("pD is NaN"));
    }

    #[test]
    fn test_error_conversion() {
        let str_err: WellTestError = "test error".into();
        match str_err {
            WellTestError::Other(s) => assert_eq!(s, "test error"),
            _ => panic!("Expected Other variant"),
        }
    }
}
