//! Error types for kgforge

use thiserror::Error;

/// Maximum number of characters of an offending payload kept for diagnostics
const PAYLOAD_SNIPPET_LEN: usize = 256;

/// Main error type for kgforge operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required input was missing or empty
    #[error("Validation error: {0}")]
    Validation(String),

    /// The external structured-generation call failed
    #[error("Generation error: {message}")]
    Generation {
        /// What the generation call was asked to do
        message: String,
        /// Underlying cause, when one exists
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Generation output could not be normalized into the expected shape
    #[error("Parse error: {detail}")]
    Parse {
        /// What went wrong during normalization
        detail: String,
        /// Truncated snippet of the offending payload
        payload: String,
        /// Underlying cause, when one exists
        #[source]
        source: Option<anyhow::Error>,
    },

    /// An expected intermediate result was missing from the pipeline context
    #[error("State error: {0}")]
    State(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The run was cancelled by the caller
    #[error("Run cancelled")]
    Cancelled,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for kgforge operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a generation error without an underlying cause
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a generation error wrapping an underlying cause
    pub fn generation_with_source(
        msg: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Generation {
            message: msg.into(),
            source: Some(source.into()),
        }
    }

    /// Create a parse error, keeping a truncated snippet of the payload
    pub fn parse(detail: impl Into<String>, payload: &str) -> Self {
        Self::Parse {
            detail: detail.into(),
            payload: snippet(payload),
            source: None,
        }
    }

    /// Create a parse error wrapping an underlying cause
    pub fn parse_with_source(
        detail: impl Into<String>,
        payload: &str,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Parse {
            detail: detail.into(),
            payload: snippet(payload),
            source: Some(source.into()),
        }
    }

    /// Create a state error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a parse error
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Check if this is a generation error
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

fn snippet(payload: &str) -> String {
    if payload.chars().count() <= PAYLOAD_SNIPPET_LEN {
        payload.to_string()
    } else {
        let mut out: String = payload.chars().take(PAYLOAD_SNIPPET_LEN).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::validation("document_text must not be empty");
        assert_eq!(
            err.to_string(),
            "Validation error: document_text must not be empty"
        );

        let err = Error::generation("entity extraction call failed");
        assert_eq!(
            err.to_string(),
            "Generation error: entity extraction call failed"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(Error::validation("x").is_validation());
        assert!(Error::parse("bad json", "{").is_parse());
        assert!(Error::generation("boom").is_generation());
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::state("missing entities").is_parse());
    }

    #[test]
    fn test_parse_error_keeps_payload_snippet() {
        let long_payload = "x".repeat(1000);
        let err = Error::parse("shape mismatch", &long_payload);
        match err {
            Error::Parse { payload, .. } => {
                assert!(payload.len() < 300);
                assert!(payload.ends_with("..."));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_wraps_cause() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = Error::parse_with_source("invalid JSON", "not json", json_err);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
