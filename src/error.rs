//! Error types for the response guard.
//!
//! None of these ever reach the host pipeline. They exist so each layer can
//! report what went wrong before the caller logs it and degrades.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rule load error: {0}")]
    RuleLoad(#[from] RuleLoadError),

    #[error("Annotation error: {0}")]
    Annotation(#[from] AnnotationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while turning raw rule text into a rule list.
///
/// Every variant is recoverable: the caller substitutes an empty rule set.
#[derive(Debug, thiserror::Error)]
pub enum RuleLoadError {
    #[error("'{key}' is not valid JSON: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{key}' is not a JSON array (found {found})")]
    NotArray { key: String, found: &'static str },

    #[error("Parse worker for '{key}' failed: {reason}")]
    Worker { key: String, reason: String },
}

/// Failure while attaching the diagnostic annotation to a message.
#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    #[error("Message does not accept annotations: {0}")]
    Rejected(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
