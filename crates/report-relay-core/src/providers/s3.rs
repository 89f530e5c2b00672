//! AWS S3 object store using signed REST `GET` requests.
//!
//! Objects are addressed virtual-host style
//! (`https://{bucket}.s3.{region}.amazonaws.com/{key}`) against AWS and
//! path style (`{endpoint}/{bucket}/{key}`) when an endpoint override is
//! configured, which is what local emulators expect.

use crate::client::ObjectStore;
use crate::config::RelayConfig;
use crate::error::ProviderError;
use crate::providers::endpoint::ServiceEndpoint;
use crate::providers::signing::{
    payload_hash, uri_encode, uri_encode_path, SignableRequest, SigV4Signer,
};
use crate::providers::xml::first_element_text;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::Client as HttpClient;
use std::fmt;
use tracing::debug;

#[cfg(test)]
#[path = "s3_tests.rs"]
mod tests;

/// AWS S3 object store
pub struct S3ObjectStore {
    http_client: HttpClient,
    signer: SigV4Signer,
    region: String,
    endpoint_override: Option<ServiceEndpoint>,
}

impl S3ObjectStore {
    /// Create new S3 client
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the endpoint override is invalid and
    /// `NetworkError` if the HTTP client cannot be built.
    pub fn new(config: &RelayConfig) -> Result<Self, ProviderError> {
        let endpoint_override = config
            .endpoint_url
            .as_deref()
            .map(ServiceEndpoint::parse)
            .transpose()?;

        let http_client = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                ProviderError::NetworkError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            signer: SigV4Signer::new(config.credentials.clone(), &config.region, "s3"),
            region: config.region.clone(),
            endpoint_override,
        })
    }

    /// Endpoint and encoded request path for one object
    fn locate(&self, bucket: &str, key: &str) -> Result<(ServiceEndpoint, String), ProviderError> {
        let encoded_key = uri_encode_path(key);
        match &self.endpoint_override {
            Some(endpoint) => Ok((
                endpoint.clone(),
                format!("/{}/{}", uri_encode(bucket), encoded_key),
            )),
            None => {
                let endpoint = ServiceEndpoint::parse(&format!(
                    "https://{}.s3.{}.amazonaws.com",
                    bucket, self.region
                ))?;
                Ok((endpoint, format!("/{}", encoded_key)))
            }
        }
    }
}

impl fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("region", &self.region)
            .field("endpoint_override", &self.endpoint_override)
            .finish()
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, ProviderError> {
        let (endpoint, path) = self.locate(bucket, key)?;
        let hash = payload_hash(b"");

        let headers = self.signer.sign(
            &SignableRequest {
                method: "GET",
                host: endpoint.host(),
                path: &path,
                query: &[],
                payload_hash: &hash,
            },
            &Utc::now(),
        );

        let url = endpoint.url_for(&path);
        debug!(url = %url, "Fetching S3 object");

        let mut request = self.http_client.get(&url);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::NetworkError(format!("Request timeout: {}", e))
            } else if e.is_connect() {
                ProviderError::NetworkError(format!("Connection failed: {}", e))
            } else {
                ProviderError::NetworkError(format!("HTTP request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            // Error bodies may be empty, mapping then falls back to the status
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error_response(&body, status.as_u16(), bucket, key));
        }

        response.bytes().await.map_err(|e| {
            ProviderError::NetworkError(format!("Failed to read response body: {}", e))
        })
    }
}

/// Map an S3 error response to a provider error
fn parse_error_response(xml: &str, status_code: u16, bucket: &str, key: &str) -> ProviderError {
    let code = first_element_text(xml, b"Code").unwrap_or_default();
    let message =
        first_element_text(xml, b"Message").unwrap_or_else(|| "Unknown error".to_string());

    match (code.as_str(), status_code) {
        ("NoSuchKey", _) | (_, 404) if code != "NoSuchBucket" => ProviderError::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        ("InvalidAccessKeyId", _) | ("SignatureDoesNotMatch", _) | ("ExpiredToken", _) => {
            ProviderError::Authentication(format!("{}: {}", code, message))
        }
        (_, 403) => ProviderError::AccessDenied(format!("{}/{}: {}", bucket, key, message)),
        _ => ProviderError::ServiceError(format!("{} ({}): {}", code, status_code, message)),
    }
}
