//! Queue addresses, message identifiers and FIFO ordering keys.

use chrono::{DateTime, Utc};
use std::str::FromStr;

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

/// Address schemes that mark a queue identifier as already fully qualified
const ADDRESS_SCHEMES: [&str; 2] = ["https://", "http://"];

/// Suffix shared by all strictly-ordered queue names
const FIFO_SUFFIX: &str = ".fifo";

// ============================================================================
// Queue Identification
// ============================================================================

/// A queue identifier as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueTarget {
    /// Fully-qualified queue URL, used as-is
    Address(QueueAddress),
    /// Short logical name that must be resolved by the queue service
    Name(String),
}

impl QueueTarget {
    /// Classify a raw identifier by its scheme prefix
    pub fn parse(identifier: &str) -> Self {
        let identifier = identifier.trim();
        if ADDRESS_SCHEMES
            .iter()
            .any(|scheme| identifier.starts_with(scheme))
        {
            Self::Address(QueueAddress(identifier.to_string()))
        } else {
            Self::Name(identifier.to_string())
        }
    }
}

impl FromStr for QueueTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Concrete, addressable queue URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueAddress(String);

impl QueueAddress {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Strictly-ordered queues require group and deduplication keys
    pub fn is_fifo(&self) -> bool {
        self.queue_name().ends_with(FIFO_SUFFIX)
    }

    /// Final path segment of the address
    pub fn queue_name(&self) -> &str {
        self.0
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Message Identification
// ============================================================================

/// Identifier assigned to a submitted message by the queue service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    /// Generate new random message ID
    pub fn new() -> Self {
        let id = uuid::Uuid::new_v4();
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("message id cannot be empty".to_string());
        }

        Ok(Self(s.to_string()))
    }
}

// ============================================================================
// FIFO Ordering
// ============================================================================

/// Token a FIFO queue uses to collapse duplicate submissions
///
/// Two submissions carrying the same key inside the queue's deduplication
/// window are delivered once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive a key from a wall-clock instant as `<unix seconds>.<microseconds>`
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(format!(
            "{}.{:06}",
            at.timestamp(),
            at.timestamp_subsec_micros()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Group and deduplication keys attached to a FIFO submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingKeys {
    pub group_key: String,
    pub dedup_key: DedupKey,
}

impl OrderingKeys {
    pub fn new(group_key: impl Into<String>, dedup_key: DedupKey) -> Self {
        Self {
            group_key: group_key.into(),
            dedup_key,
        }
    }
}
