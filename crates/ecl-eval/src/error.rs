//! Error types for ECL evaluation.

use thiserror::Error;

/// Errors raised while compiling an ECL constraint into a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The AST contains a construct the evaluator has no handler for,
    /// such as a member-of target that is neither a reference nor a
    /// nested expression.
    #[error("unsupported ECL construct: {0}")]
    UnsupportedConstraint(String),

    /// Caller-supplied input is malformed, for example an effective time
    /// filter whose value is not an 8-digit date.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The concept graph reader failed.
    #[error("graph access failed: {0}")]
    Graph(String),
}

impl EvalError {
    /// Creates an [`EvalError::UnsupportedConstraint`] naming the offending
    /// construct.
    pub fn unsupported(what: impl Into<String>) -> Self {
        EvalError::UnsupportedConstraint(what.into())
    }

    /// Creates an [`EvalError::BadRequest`] with the given message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        EvalError::BadRequest(message.into())
    }

    /// Creates an [`EvalError::Graph`] from any displayable backend error.
    pub fn graph(source: impl std::fmt::Display) -> Self {
        EvalError::Graph(source.to_string())
    }
}

/// Result type for evaluation operations.
pub type EvalResult<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvalError::unsupported("member-of target: And");
        assert_eq!(err.to_string(), "unsupported ECL construct: member-of target: And");

        let err = EvalError::bad_request("effective time must be yyyyMMdd");
        assert!(err.to_string().starts_with("bad request"));
    }

    #[test]
    fn test_graph_error_from_display() {
        let err = EvalError::graph(std::fmt::Error);
        assert!(matches!(err, EvalError::Graph(_)));
    }
}
