//! Result retrieval poll loop.
//!
//! A retrieval asks the object store for one key until it exists, the
//! attempt bound runs out, or the store fails in any other way:
//!
//! ```text
//! Attempting ──ok──────────────► write ─► classify ─► RetrievedArtifact
//!     │  ▲
//!     │  └── not found, waiting, attempts left ── sleep(delay)
//!     ├───── not found, no wait ─────────────────► NotFound
//!     ├───── not found, bound reached ───────────► Timeout
//!     └───── any other error ────────────────────► HardFailure
//! ```
//!
//! The downloaded bytes are written to a hidden sibling file and moved onto
//! the destination only once they are flushed, synced and closed. The
//! optional classification rename is a second single `rename`, so the result
//! is always visible under exactly one complete name.

use crate::client::ObjectStore;
use crate::error::RelayError;
use crate::format::{FormatSignature, FormatTable};
use crate::runtime::{Sleeper, TokioSleeper};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, info};

#[cfg(test)]
#[path = "retriever_tests.rs"]
mod tests;

/// Hard ceiling on poll attempts regardless of caller input
pub const MAX_POLL_ATTEMPTS: u32 = 30;

/// Fixed delay between attempts while waiting for a result
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(2);

// ============================================================================
// Poll Policy
// ============================================================================

/// Attempt bound and inter-attempt delay for a retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    wait: bool,
    max_attempts: u32,
    delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::no_wait()
    }
}

impl PollPolicy {
    /// Single attempt; a missing object fails immediately
    pub fn no_wait() -> Self {
        Self {
            wait: false,
            max_attempts: 1,
            delay: DEFAULT_POLL_DELAY,
        }
    }

    /// Retry missing objects up to `max_attempts` times, `delay` apart
    ///
    /// The bound is clamped to `1..=MAX_POLL_ATTEMPTS`.
    pub fn waiting(max_attempts: u32, delay: Duration) -> Self {
        Self {
            wait: true,
            max_attempts: max_attempts.clamp(1, MAX_POLL_ATTEMPTS),
            delay,
        }
    }

    /// Policy matching a CLI-style `--wait` switch
    pub fn from_wait_flag(wait: bool) -> Self {
        if wait {
            Self::waiting(MAX_POLL_ATTEMPTS, DEFAULT_POLL_DELAY)
        } else {
            Self::no_wait()
        }
    }

    pub fn wait(&self) -> bool {
        self.wait
    }

    /// Effective attempt bound
    pub fn max_attempts(&self) -> u32 {
        if self.wait {
            self.max_attempts.clamp(1, MAX_POLL_ATTEMPTS)
        } else {
            1
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

// ============================================================================
// Targets and Results
// ============================================================================

/// Object to fetch and where to put it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalTarget {
    pub bucket: String,
    pub key: String,
    pub destination: PathBuf,
}

impl RetrievalTarget {
    /// Build a target; without an explicit destination the object key is used
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        destination: Option<PathBuf>,
    ) -> Self {
        let key = key.into();
        let destination = destination.unwrap_or_else(|| PathBuf::from(&key));
        Self {
            bucket: bucket.into(),
            key,
            destination,
        }
    }
}

/// A result saved to the local filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedArtifact {
    /// Final location, after any classification rename
    pub path: PathBuf,
    /// Detected format, when classification ran and matched
    pub format: Option<FormatSignature>,
    /// Number of store requests made
    pub attempts: u32,
    pub size_bytes: u64,
}

// ============================================================================
// Retriever
// ============================================================================

/// Polls an object store for a result and saves it locally
pub struct ResultRetriever<'a, S: ObjectStore + ?Sized, Z: Sleeper = TokioSleeper> {
    store: &'a S,
    sleeper: Z,
    policy: PollPolicy,
    formats: FormatTable,
}

impl<'a, S: ObjectStore + ?Sized> ResultRetriever<'a, S, TokioSleeper> {
    pub fn new(store: &'a S, policy: PollPolicy) -> Self {
        Self::with_sleeper(store, policy, TokioSleeper)
    }
}

impl<'a, S: ObjectStore + ?Sized, Z: Sleeper> ResultRetriever<'a, S, Z> {
    pub fn with_sleeper(store: &'a S, policy: PollPolicy, sleeper: Z) -> Self {
        Self {
            store,
            sleeper,
            policy,
            formats: FormatTable::standard(),
        }
    }

    /// Replace the standard ZIP/XML signature table
    pub fn with_formats(mut self, formats: FormatTable) -> Self {
        self.formats = formats;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Fetch the target object, save it and normalise its extension
    ///
    /// # Errors
    ///
    /// - `NotFound` when the object is missing and waiting is disabled
    /// - `Timeout` when the object is still missing after the attempt bound
    /// - `HardFailure` for any other store error or a local filesystem error
    pub async fn retrieve(&self, target: &RetrievalTarget) -> Result<RetrievedArtifact, RelayError> {
        let max_attempts = self.policy.max_attempts();
        info!(
            bucket = %target.bucket,
            key = %target.key,
            destination = %target.destination.display(),
            max_attempts = max_attempts,
            "Downloading result"
        );

        let mut attempts = 0;
        let body = loop {
            attempts += 1;
            match self.store.get_object(&target.bucket, &target.key).await {
                Ok(body) => break body,
                Err(e) if e.is_not_found() => {
                    if !self.policy.wait() {
                        return Err(RelayError::NotFound {
                            bucket: target.bucket.clone(),
                            key: target.key.clone(),
                        });
                    }
                    if attempts >= max_attempts {
                        error!(attempts = attempts, "Timed out waiting for result");
                        return Err(RelayError::Timeout {
                            bucket: target.bucket.clone(),
                            key: target.key.clone(),
                            attempts,
                        });
                    }

                    info!(
                        "[{}/{}] Result not ready yet, waiting {:?}",
                        attempts,
                        max_attempts,
                        self.policy.delay()
                    );
                    self.sleeper.sleep(self.policy.delay()).await;
                }
                Err(e) => {
                    error!(error = %e, attempt = attempts, "Object store request failed");
                    return Err(RelayError::store(e));
                }
            }
        };

        let size_bytes = write_atomically(&target.destination, &body).await?;
        info!(
            path = %target.destination.display(),
            size_bytes = size_bytes,
            attempts = attempts,
            "Downloaded result"
        );

        let (path, format) = self.classify(&target.destination).await?;

        Ok(RetrievedArtifact {
            path,
            format,
            attempts,
            size_bytes,
        })
    }

    /// Rename a saved file to carry the extension matching its content
    ///
    /// Files that already carry a canonical extension are left alone.
    async fn classify(
        &self,
        path: &Path,
    ) -> Result<(PathBuf, Option<FormatSignature>), RelayError> {
        if !self.formats.needs_classification(path) {
            debug!(path = %path.display(), "Destination already has a canonical extension");
            return Ok((path.to_path_buf(), None));
        }

        let header = read_header(path, self.formats.header_len())
            .await
            .map_err(|e| RelayError::filesystem("read", path, e))?;

        let Some(signature) = self.formats.classify(&header).copied() else {
            debug!(path = %path.display(), "No format signature matched");
            return Ok((path.to_path_buf(), None));
        };

        let renamed = path.with_extension(signature.extension);
        info!(
            format = signature.name,
            from = %path.display(),
            to = %renamed.display(),
            "Detected format, renaming"
        );

        fs::rename(path, &renamed)
            .await
            .map_err(|e| RelayError::filesystem("rename", path, e))?;

        Ok((renamed, Some(signature)))
    }
}

// ============================================================================
// Filesystem Helpers
// ============================================================================

/// Hidden sibling used while the download is being written
fn partial_path(destination: &Path) -> PathBuf {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    destination.with_file_name(format!(".{}.part", file_name))
}

/// Write `body` so that `destination` only ever holds complete content
async fn write_atomically(destination: &Path, body: &[u8]) -> Result<u64, RelayError> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| RelayError::filesystem("create directory", parent, e))?;
    }

    let temp_path = partial_path(destination);
    if let Err(e) = write_and_sync(&temp_path, body).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(RelayError::filesystem("write", &temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, destination).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(RelayError::filesystem("move into place", destination, e));
    }

    Ok(body.len() as u64)
}

/// The file handle is closed when this returns
async fn write_and_sync(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(body).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

async fn read_header(path: &Path, len: usize) -> std::io::Result<Vec<u8>> {
    let file = fs::File::open(path).await?;
    let mut header = Vec::with_capacity(len);
    file.take(len as u64).read_to_end(&mut header).await?;
    Ok(header)
}
