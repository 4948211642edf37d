//! Error types for ReviewLens

/// Result type alias using ReviewLens's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ReviewLens operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or out-of-range caller input
    #[error("validation error: {0}")]
    Validation(String),

    /// Review id not present in the store
    #[error("review {0} not found")]
    NotFound(i64),

    /// Model adapter unavailable or failed during a forward pass
    #[error("inference error: {0}")]
    Inference(String),

    /// Record store unreachable or constraint violation
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Inference exceeded the configured timeout
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a model reload may clear this error
    pub fn is_inference(&self) -> bool {
        matches!(self, Self::Inference(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_inference_errors_trigger_reload() {
        assert!(Error::inference("gone").is_inference());
        assert!(!Error::Timeout.is_inference());
        assert!(!Error::validation("bad").is_inference());
        assert!(!Error::storage("locked").is_inference());
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(Error::NotFound(42).to_string(), "review 42 not found");
    }
}
