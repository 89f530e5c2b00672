//! In-memory queue service and object store.
//!
//! These providers behave like the hosted services closely enough to drive
//! the dispatcher and the retriever end to end:
//! - queues are resolved by name and listed by prefix
//! - FIFO submissions to one queue sharing a deduplication key inside the
//!   deduplication window are delivered once, whatever their group key
//! - objects can be made to appear only after a number of misses
//! - outages and per-object failures can be injected
//!
//! They are intended for unit tests and local development.

use crate::client::{ObjectStore, QueueService};
use crate::error::ProviderError;
use crate::message::{DedupKey, MessageId, OrderingKeys, QueueAddress};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// Window in which a repeated deduplication key is collapsed, in seconds
pub const DEDUP_WINDOW_SECS: i64 = 5 * 60;

const DEFAULT_BASE_URL: &str = "https://sqs.memory.local/000000000000";

// ============================================================================
// Queue Service
// ============================================================================

/// A message accepted by the in-memory queue service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub message_id: MessageId,
    pub queue: QueueAddress,
    pub body: String,
    pub ordering: Option<OrderingKeys>,
    pub enqueued_at: DateTime<Utc>,
}

type DedupEntry = (QueueAddress, DedupKey);

#[derive(Default)]
struct QueueState {
    queues: BTreeMap<String, QueueAddress>,
    delivered: Vec<DeliveredMessage>,
    dedup: HashMap<DedupEntry, (MessageId, DateTime<Utc>)>,
    outage: Option<ProviderError>,
    send_calls: u32,
}

/// Queue service holding all state in process memory
pub struct InMemoryQueueService {
    base_url: String,
    state: RwLock<QueueState>,
}

impl Default for InMemoryQueueService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueueService {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            state: RwLock::new(QueueState::default()),
        }
    }

    /// Builder form of [`Self::create_queue`]
    pub fn with_queue(self, name: &str) -> Self {
        self.create_queue(name);
        self
    }

    /// Create a queue (or return the existing one) and give back its address
    pub fn create_queue(&self, name: &str) -> QueueAddress {
        let address = QueueAddress::new(format!("{}/{}", self.base_url, name));
        self.write()
            .queues
            .entry(name.to_string())
            .or_insert(address)
            .clone()
    }

    /// Make every subsequent call fail with `error`, or restore service with `None`
    pub fn set_outage(&self, error: Option<ProviderError>) {
        self.write().outage = error;
    }

    /// All messages accepted so far, in submission order
    pub fn delivered(&self) -> Vec<DeliveredMessage> {
        self.read().delivered.clone()
    }

    /// Number of `send_message` calls received, including collapsed duplicates
    pub fn send_calls(&self) -> u32 {
        self.read().send_calls
    }

    fn read(&self) -> RwLockReadGuard<'_, QueueState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, QueueState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl QueueService for InMemoryQueueService {
    async fn resolve_queue_url(&self, name: &str) -> Result<QueueAddress, ProviderError> {
        let state = self.read();
        if let Some(error) = &state.outage {
            return Err(error.clone());
        }

        state
            .queues
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::QueueNotFound(name.to_string()))
    }

    async fn list_queue_urls(
        &self,
        prefix: Option<&str>,
    ) -> Result<Vec<QueueAddress>, ProviderError> {
        let state = self.read();
        if let Some(error) = &state.outage {
            return Err(error.clone());
        }

        Ok(state
            .queues
            .iter()
            .filter(|(name, _)| prefix.map_or(true, |p| name.starts_with(p)))
            .map(|(_, address)| address.clone())
            .collect())
    }

    async fn send_message(
        &self,
        queue: &QueueAddress,
        body: &str,
        ordering: Option<&OrderingKeys>,
    ) -> Result<MessageId, ProviderError> {
        let mut guard = self.write();
        let state = &mut *guard;
        state.send_calls += 1;

        if let Some(error) = &state.outage {
            return Err(error.clone());
        }

        if !state.queues.values().any(|q| q == queue) {
            return Err(ProviderError::QueueNotFound(queue.to_string()));
        }

        if queue.is_fifo() && ordering.is_none() {
            return Err(ProviderError::ServiceError(
                "MissingParameter: FIFO queues require a MessageGroupId".to_string(),
            ));
        }

        let now = Utc::now();
        if let Some(keys) = ordering {
            let entry = (queue.clone(), keys.dedup_key.clone());
            if let Some((message_id, accepted_at)) = state.dedup.get(&entry) {
                if now - *accepted_at < Duration::seconds(DEDUP_WINDOW_SECS) {
                    return Ok(message_id.clone());
                }
            }
        }

        let message_id = MessageId::new();
        if let Some(keys) = ordering {
            state
                .dedup
                .insert((queue.clone(), keys.dedup_key.clone()), (message_id.clone(), now));
        }

        state.delivered.push(DeliveredMessage {
            message_id: message_id.clone(),
            queue: queue.clone(),
            body: body.to_string(),
            ordering: ordering.cloned(),
            enqueued_at: now,
        });

        Ok(message_id)
    }
}

// ============================================================================
// Object Store
// ============================================================================

type ObjectKey = (String, String);

#[derive(Default)]
struct StoreState {
    objects: HashMap<ObjectKey, Bytes>,
    /// Objects that become visible after the given number of misses
    pending: HashMap<ObjectKey, (u32, Bytes)>,
    failures: HashMap<ObjectKey, ProviderError>,
    get_calls: u32,
}

/// Object store holding all objects in process memory
#[derive(Default)]
pub struct InMemoryObjectStore {
    state: RwLock<StoreState>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object that is immediately available
    pub fn put_object(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.write()
            .objects
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    /// Store an object that reports "not found" for the first `misses` requests
    pub fn put_object_after(&self, bucket: &str, key: &str, misses: u32, body: impl Into<Bytes>) {
        self.write()
            .pending
            .insert((bucket.to_string(), key.to_string()), (misses, body.into()));
    }

    /// Make every request for this object fail with `error`
    pub fn fail_object(&self, bucket: &str, key: &str, error: ProviderError) {
        self.write()
            .failures
            .insert((bucket.to_string(), key.to_string()), error);
    }

    /// Number of `get_object` calls received
    pub fn get_calls(&self) -> u32 {
        self.read().get_calls
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, ProviderError> {
        let mut guard = self.write();
        let state = &mut *guard;
        state.get_calls += 1;

        let object_key = (bucket.to_string(), key.to_string());
        if let Some(error) = state.failures.get(&object_key) {
            return Err(error.clone());
        }

        let ready = match state.pending.get_mut(&object_key) {
            Some((misses, _)) if *misses > 0 => {
                *misses -= 1;
                false
            }
            Some(_) => true,
            None => false,
        };
        if ready {
            if let Some((_, body)) = state.pending.remove(&object_key) {
                state.objects.insert(object_key.clone(), body);
            }
        }

        state
            .objects
            .get(&object_key)
            .cloned()
            .ok_or_else(|| ProviderError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
