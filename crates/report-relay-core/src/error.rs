//! Error types for queue and object-store operations.

use std::path::Path;
use thiserror::Error;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

/// Errors reported by a queue service or object store implementation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("Object not found: s3://{bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    /// The queue service refused the body for its size
    #[error("Message too large: {0}")]
    MessageTooLarge(String),

    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ProviderError {
    /// Check if the error means the requested queue or object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::QueueNotFound(_) | Self::ObjectNotFound { .. })
    }
}

/// Protocol-level failures of a dispatch or retrieval invocation.
///
/// Every variant is terminal for the invocation that produced it. The only
/// retried condition (an object that does not exist yet while waiting) never
/// escapes the poll loop as an error until the attempt bound is exhausted.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Could not resolve queue '{queue}': {source}")]
    ResolutionFailed {
        queue: String,
        #[source]
        source: ProviderError,
    },

    #[error("Queue service unavailable: {source}")]
    ServiceUnavailable {
        #[source]
        source: ProviderError,
    },

    #[error("Failed to submit message to {queue}: {source}")]
    SubmissionFailed {
        queue: String,
        #[source]
        source: ProviderError,
    },

    #[error("Object s3://{bucket}/{key} does not exist")]
    NotFound { bucket: String, key: String },

    #[error("Timed out waiting for s3://{bucket}/{key} after {attempts} attempts")]
    Timeout {
        bucket: String,
        key: String,
        attempts: u32,
    },

    #[error("Retrieval failed: {message}")]
    HardFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RelayError {
    /// Build a hard failure caused by an object-store error
    pub fn store(source: ProviderError) -> Self {
        Self::HardFailure {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a hard failure caused by a local filesystem error
    pub fn filesystem(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::HardFailure {
            message: format!("{} {}: {}", action, path.display(), source),
            source: Some(Box::new(source)),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration parsing failed: {message}")]
    Parsing { message: String },
}
