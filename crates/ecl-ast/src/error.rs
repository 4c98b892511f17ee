//! Error types for ECL parsing.

use thiserror::Error;

/// Errors that can occur during ECL parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Parse error at a specific position in the input.
    #[error("syntax error at position {position}: {message}")]
    Syntax {
        /// Position in the input where the error occurred.
        position: usize,
        /// Description of the error.
        message: String,
    },

    /// More input was expected.
    #[error("incomplete ECL expression")]
    Incomplete,

    /// Empty input provided.
    #[error("empty ECL expression")]
    EmptyExpression,
}

/// Result type for parsing operations.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
