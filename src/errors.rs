//! Error types for per-function analysis.
//!
//! Analyses that look at a single function (scope resolution, control flow,
//! complexity, call extraction) return [`ClassificationError`]. Batch loops
//! inspect the error, log it and drop the function; nothing here aborts a run.
//! Application-level paths (JSON stage files, git, configuration) use
//! `anyhow::Result` with context instead.

use thiserror::Error;

/// Failure to analyze one function's source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    /// The source could not be parsed, or parsed with syntax errors
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// The source parsed but contains no function definition
    #[error("No function definition found in source")]
    NoFunctionDefinition,
}

impl ClassificationError {
    /// Create a parse error with a message
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Whether this error came from the parser rather than from the shape of
    /// the source
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Result alias for per-function analysis
pub type ClassificationResult<T> = Result<T, ClassificationError>;
