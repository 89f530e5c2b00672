//! Service endpoint addressing.

use crate::error::ProviderError;
use url::Url;

/// Scheme and authority of a service endpoint
///
/// Any path on the configured URL is ignored; requests supply their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    base: String,
    host: String,
}

impl ServiceEndpoint {
    /// Parse an endpoint URL such as `https://sqs.us-east-2.amazonaws.com`
    /// or `http://localhost:4566`
    pub fn parse(url: &str) -> Result<Self, ProviderError> {
        let parsed = Url::parse(url).map_err(|e| {
            ProviderError::ConfigurationError(format!("Invalid endpoint URL '{}': {}", url, e))
        })?;

        let host_name = parsed.host_str().ok_or_else(|| {
            ProviderError::ConfigurationError(format!("Endpoint URL '{}' has no host", url))
        })?;

        // Url::port() is None for the scheme's default port, which is also
        // what the Host header omits
        let host = match parsed.port() {
            Some(port) => format!("{}:{}", host_name, port),
            None => host_name.to_string(),
        };

        Ok(Self {
            base: format!("{}://{}", parsed.scheme(), host),
            host,
        })
    }

    /// Value of the `Host` header for requests to this endpoint
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Absolute URL for an already-encoded path starting with `/`
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}
