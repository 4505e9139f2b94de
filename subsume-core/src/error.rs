//! Error types shared across the subsume engine

use subsume_pattern::PatternError;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error type.
///
/// Structural problems are rejected by the canonicalizer up front, so the
/// kernels themselves never produce `InvalidSchema`.
#[derive(Debug, Error)]
pub enum Error {
    /// Structurally malformed input schema
    #[error("Invalid schema at {location}: {message}")]
    InvalidSchema { location: String, message: String },

    /// A `$ref` that cannot be resolved within the document
    #[error("Unresolved reference '{reference}' at {location}")]
    UnresolvedReference { reference: String, location: String },

    /// A construct the decision procedure cannot reason about exactly
    #[error("Unsupported construct at {location}: {message}")]
    Unsupported { location: String, message: String },

    /// JSON parsing error (serde_json)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid-schema error
    pub fn invalid_schema(location: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create an unresolved-reference error
    pub fn unresolved_reference(
        reference: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Error::UnresolvedReference {
            reference: reference.into(),
            location: location.into(),
        }
    }

    /// Create an unsupported-construct error
    pub fn unsupported(location: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Unsupported {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Lift a pattern-engine failure, attaching the schema location.
    ///
    /// Malformed patterns count as invalid schemas; out-of-dialect patterns
    /// stay `Unsupported` so callers can distinguish exit codes.
    pub fn from_pattern(location: impl Into<String>, err: PatternError) -> Self {
        match err {
            PatternError::Parse { .. } => Error::invalid_schema(location, err.to_string()),
            PatternError::Unsupported { .. } => Error::unsupported(location, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_error_classification() {
        let parse = subsume_pattern::Pattern::parse("(a").unwrap_err();
        assert!(matches!(
            Error::from_pattern("/pattern", parse),
            Error::InvalidSchema { .. }
        ));

        let unsupported = subsume_pattern::Pattern::parse("a(?=b)").unwrap_err();
        assert!(matches!(
            Error::from_pattern("/pattern", unsupported),
            Error::Unsupported { .. }
        ));
    }
}
