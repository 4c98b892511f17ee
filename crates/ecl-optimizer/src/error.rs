//! Error types for the optimizer crate.

/// Result type for optimizer operations.
pub type OptimizerResult<T> = Result<T, OptimizerError>;

/// Errors that can occur while building statistics or evaluating
/// candidate clauses.
///
/// The optimizer's public entry point never surfaces these: a failure
/// while evaluating the caller's own clauses abandons the run with an
/// empty diff, and a failure on an internally generated candidate skips
/// that candidate.
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    /// A clause's text is not valid ECL.
    #[error("ECL parse error: {0}")]
    Parse(#[from] ecl_ast::ParseError),

    /// Compiling or resolving a clause against the graph failed.
    #[error("ECL evaluation error: {0}")]
    Evaluation(#[from] ecl_eval::EvalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_error_display() {
        let err: OptimizerError = ecl_eval::EvalError::bad_request("broken").into();
        assert!(err.to_string().contains("broken"));
    }
}
