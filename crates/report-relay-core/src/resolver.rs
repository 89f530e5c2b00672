//! Queue target resolution.
//!
//! Turns whatever the caller supplied (a URL, a short name, or nothing at
//! all) into either a concrete [`QueueAddress`] or a list of candidates the
//! caller must choose from. Resolution never retries.

use crate::client::QueueService;
use crate::error::RelayError;
use crate::message::{QueueAddress, QueueTarget};
use tracing::{debug, info};

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;

/// Outcome of resolving a queue identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueResolution {
    /// A single addressable queue
    Resolved(QueueAddress),
    /// No identifier was given; these queues are the available choices
    Candidates(Vec<QueueAddress>),
}

/// Resolves queue identifiers against a queue service
pub struct QueueResolver<'a, Q: QueueService + ?Sized> {
    service: &'a Q,
}

impl<'a, Q: QueueService + ?Sized> QueueResolver<'a, Q> {
    pub fn new(service: &'a Q) -> Self {
        Self { service }
    }

    /// Resolve an optional queue identifier
    ///
    /// `prefix` only narrows the candidate listing and is ignored when an
    /// identifier is present.
    ///
    /// # Errors
    ///
    /// - `ResolutionFailed` when a logical name is not bound to any queue
    /// - `ServiceUnavailable` for any other queue service failure
    ///
    /// # Examples
    ///
    /// ```
    /// use report_relay_core::providers::InMemoryQueueService;
    /// use report_relay_core::{QueueResolution, QueueResolver};
    ///
    /// # tokio_test::block_on(async {
    /// let service = InMemoryQueueService::new().with_queue("FL_acc.fifo");
    /// let resolver = QueueResolver::new(&service);
    ///
    /// match resolver.resolve(Some("FL_acc.fifo"), None).await? {
    ///     QueueResolution::Resolved(address) => assert!(address.is_fifo()),
    ///     QueueResolution::Candidates(_) => unreachable!(),
    /// }
    /// # Ok::<(), report_relay_core::RelayError>(())
    /// # }).unwrap();
    /// ```
    pub async fn resolve(
        &self,
        identifier: Option<&str>,
        prefix: Option<&str>,
    ) -> Result<QueueResolution, RelayError> {
        match identifier.map(str::trim).filter(|id| !id.is_empty()) {
            Some(identifier) => self
                .resolve_target(QueueTarget::parse(identifier))
                .await
                .map(QueueResolution::Resolved),
            None => self.list_candidates(prefix).await,
        }
    }

    /// Resolve a single target to an address
    pub async fn resolve_target(&self, target: QueueTarget) -> Result<QueueAddress, RelayError> {
        match target {
            QueueTarget::Address(address) => {
                debug!(queue = %address, "Queue identifier is already fully qualified");
                Ok(address)
            }
            QueueTarget::Name(name) => {
                let address = self.service.resolve_queue_url(&name).await.map_err(|e| {
                    if e.is_not_found() {
                        RelayError::ResolutionFailed {
                            queue: name.clone(),
                            source: e,
                        }
                    } else {
                        RelayError::ServiceUnavailable { source: e }
                    }
                })?;

                info!(queue_name = %name, queue = %address, "Resolved queue name");
                Ok(address)
            }
        }
    }

    async fn list_candidates(&self, prefix: Option<&str>) -> Result<QueueResolution, RelayError> {
        let prefix = prefix.map(str::trim).filter(|p| !p.is_empty());
        info!(prefix = ?prefix, "No queue specified, listing candidates");

        let candidates = self
            .service
            .list_queue_urls(prefix)
            .await
            .map_err(|e| RelayError::ServiceUnavailable { source: e })?;

        Ok(QueueResolution::Candidates(candidates))
    }
}
