//! Message submission.
//!
//! A dispatch is exactly one submission attempt. FIFO queues get the fixed
//! [`REPORT_REQUEST_GROUP`] group key and a deduplication key taken from the
//! clock at call time, so two calls landing on the same microsecond collapse
//! into one delivery. The payload is checked for JSON but never rejected for
//! failing that check: the remote consumer owns the schema.

use crate::client::QueueService;
use crate::error::{ProviderError, RelayError};
use crate::message::{DedupKey, MessageId, OrderingKeys, QueueAddress};
use crate::runtime::{Clock, SystemClock};
use tracing::{info, warn};

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

/// Message group used for every report request sent to a FIFO queue
pub const REPORT_REQUEST_GROUP: &str = "report_requests";

/// How the payload was interpreted before submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Payload parsed as JSON
    Json,
    /// Payload is not JSON and was sent verbatim
    RawText,
}

impl PayloadFormat {
    /// Inspect a payload without modifying it
    pub fn detect(body: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(_) => Self::Json,
            Err(_) => Self::RawText,
        }
    }
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub message_id: MessageId,
    pub queue: QueueAddress,
    pub payload_format: PayloadFormat,
    /// Keys attached to the submission when the queue is FIFO
    pub ordering: Option<OrderingKeys>,
}

/// Submits report requests to a resolved queue
pub struct MessageDispatcher<'a, Q: QueueService + ?Sized, C: Clock = SystemClock> {
    service: &'a Q,
    clock: C,
}

impl<'a, Q: QueueService + ?Sized> MessageDispatcher<'a, Q, SystemClock> {
    pub fn new(service: &'a Q) -> Self {
        Self::with_clock(service, SystemClock)
    }
}

impl<'a, Q: QueueService + ?Sized, C: Clock> MessageDispatcher<'a, Q, C> {
    pub fn with_clock(service: &'a Q, clock: C) -> Self {
        Self { service, clock }
    }

    /// Submit one message
    ///
    /// # Errors
    ///
    /// Returns `SubmissionFailed` when the payload is not UTF-8 text or when
    /// the queue service rejects the call. Size limits belong to the service
    /// and are not checked here. Nothing is retried.
    ///
    /// # Examples
    ///
    /// ```
    /// use report_relay_core::providers::InMemoryQueueService;
    /// use report_relay_core::{MessageDispatcher, REPORT_REQUEST_GROUP};
    ///
    /// # tokio_test::block_on(async {
    /// let service = InMemoryQueueService::new();
    /// let queue = service.create_queue("FL_acc.fifo");
    ///
    /// let receipt = MessageDispatcher::new(&service)
    ///     .dispatch(&queue, br#"{"id":42}"#)
    ///     .await?;
    ///
    /// let ordering = receipt.ordering.expect("FIFO queues get ordering keys");
    /// assert_eq!(ordering.group_key, REPORT_REQUEST_GROUP);
    /// # Ok::<(), report_relay_core::RelayError>(())
    /// # }).unwrap();
    /// ```
    pub async fn dispatch(
        &self,
        queue: &QueueAddress,
        payload: &[u8],
    ) -> Result<DispatchReceipt, RelayError> {
        let body = std::str::from_utf8(payload).map_err(|e| RelayError::SubmissionFailed {
            queue: queue.to_string(),
            source: ProviderError::SerializationError(format!(
                "payload is not valid UTF-8 text: {}",
                e
            )),
        })?;

        let payload_format = PayloadFormat::detect(body);
        if payload_format == PayloadFormat::RawText {
            warn!(queue = %queue, "Payload is not valid JSON, sending as raw text");
        }

        let ordering = queue.is_fifo().then(|| {
            OrderingKeys::new(
                REPORT_REQUEST_GROUP,
                DedupKey::from_timestamp(self.clock.now()),
            )
        });

        info!(
            queue = %queue,
            size_bytes = body.len(),
            dedup_key = ordering.as_ref().map(|o| o.dedup_key.as_str()),
            "Sending message"
        );

        let message_id = self
            .service
            .send_message(queue, body, ordering.as_ref())
            .await
            .map_err(|e| RelayError::SubmissionFailed {
                queue: queue.to_string(),
                source: e,
            })?;

        info!(queue = %queue, message_id = %message_id, "Message sent");

        Ok(DispatchReceipt {
            message_id,
            queue: queue.clone(),
            payload_format,
            ordering,
        })
    }
}
