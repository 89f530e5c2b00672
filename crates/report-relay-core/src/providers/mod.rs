//! Service provider implementations.
//!
//! - [`SqsQueueService`] and [`S3ObjectStore`] talk to AWS over HTTPS
//! - [`InMemoryQueueService`] and [`InMemoryObjectStore`] keep everything in
//!   process memory for tests and local runs

pub mod endpoint;
pub mod memory;
pub mod s3;
pub mod signing;
pub mod sqs;
pub mod xml;

pub use memory::{DeliveredMessage, InMemoryObjectStore, InMemoryQueueService};
pub use s3::S3ObjectStore;
pub use sqs::SqsQueueService;
