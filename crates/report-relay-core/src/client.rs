//! Service traits consumed by the dispatcher and the retriever.
//!
//! Implementations live in [`crate::providers`]: HTTP clients for SQS and S3
//! and in-memory doubles for tests and local development.

use crate::error::ProviderError;
use crate::message::{MessageId, OrderingKeys, QueueAddress};
use async_trait::async_trait;
use bytes::Bytes;

/// Queue service operations needed to resolve queues and submit messages
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Look up the address bound to a logical queue name
    ///
    /// Must return `ProviderError::QueueNotFound` when no queue has that name.
    async fn resolve_queue_url(&self, name: &str) -> Result<QueueAddress, ProviderError>;

    /// List queue addresses, optionally restricted to names starting with `prefix`
    async fn list_queue_urls(&self, prefix: Option<&str>)
        -> Result<Vec<QueueAddress>, ProviderError>;

    /// Submit one message body
    ///
    /// `ordering` is present for FIFO queues and absent otherwise.
    async fn send_message(
        &self,
        queue: &QueueAddress,
        body: &str,
        ordering: Option<&OrderingKeys>,
    ) -> Result<MessageId, ProviderError>;
}

/// Object store operations needed to fetch a result
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full content of an object
    ///
    /// Must return `ProviderError::ObjectNotFound` when the key does not exist.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, ProviderError>;
}
