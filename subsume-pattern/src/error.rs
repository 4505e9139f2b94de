//! Pattern engine error types

use thiserror::Error;

/// Result type for pattern operations
pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors raised while parsing or compiling a pattern
#[derive(Debug, Error)]
pub enum PatternError {
    /// Syntactically malformed pattern
    #[error("Invalid pattern '{pattern}' at offset {offset}: {message}")]
    Parse {
        pattern: String,
        offset: usize,
        message: String,
    },

    /// Pattern uses a construct outside the supported dialect
    /// (lookaround, backreferences, inner anchors, inline flags).
    ///
    /// The engine never guesses: anything it cannot reason about exactly
    /// is reported here instead of producing a wrong answer.
    #[error("Unsupported construct in pattern '{pattern}': {feature}")]
    Unsupported { pattern: String, feature: String },
}

impl PatternError {
    /// Create a parse error
    pub fn parse(pattern: impl Into<String>, offset: usize, message: impl Into<String>) -> Self {
        PatternError::Parse {
            pattern: pattern.into(),
            offset,
            message: message.into(),
        }
    }

    /// Create an unsupported-construct error
    pub fn unsupported(pattern: impl Into<String>, feature: impl Into<String>) -> Self {
        PatternError::Unsupported {
            pattern: pattern.into(),
            feature: feature.into(),
        }
    }
}
