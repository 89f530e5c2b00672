//! # Report Relay Core
//!
//! Client-side protocol for an asynchronous, queue-driven report service.
//!
//! This library provides:
//! - Queue resolution (fully-qualified address, logical name, or candidate listing)
//! - Single-shot message submission with FIFO deduplication keys
//! - A bounded, fixed-delay poll loop for fetching results from an object store
//! - Magic-byte format classification of downloaded results
//!
//! ## Module Organization
//!
//! - [error] - Provider errors and the protocol error taxonomy
//! - [config] - Explicit client configuration and credentials
//! - [message] - Queue addresses, message identifiers and ordering keys
//! - [client] - Service traits consumed by the dispatcher and retriever
//! - [resolver] - Queue target resolution
//! - [dispatcher] - Message submission
//! - [format] - Format signatures and classification
//! - [retriever] - Result retrieval poll loop
//! - [runtime] - Injectable clock and sleep seams
//! - [providers] - SQS, S3 and in-memory service implementations

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod message;
pub mod providers;
pub mod resolver;
pub mod retriever;
pub mod runtime;

pub use client::{ObjectStore, QueueService};
pub use config::{CredentialSettings, Credentials, RelayConfig, DEFAULT_REGION};
pub use dispatcher::{DispatchReceipt, MessageDispatcher, PayloadFormat, REPORT_REQUEST_GROUP};
pub use error::{ConfigurationError, ProviderError, RelayError};
pub use format::{FormatSignature, FormatTable, XML_SIGNATURE, ZIP_SIGNATURE};
pub use message::{DedupKey, MessageId, OrderingKeys, QueueAddress, QueueTarget};
pub use resolver::{QueueResolution, QueueResolver};
pub use retriever::{
    PollPolicy, ResultRetriever, RetrievalTarget, RetrievedArtifact, DEFAULT_POLL_DELAY,
    MAX_POLL_ATTEMPTS,
};
pub use runtime::{Clock, Sleeper, SystemClock, TokioSleeper};
