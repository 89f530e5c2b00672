//! AWS Signature Version 4 request signing.
//!
//! Shared by the SQS and S3 providers. The signer covers `host`,
//! `x-amz-content-sha256`, `x-amz-date` and, for temporary credentials,
//! `x-amz-security-token`.
//!
//! ## References
//!
//! - [AWS Signature V4](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
//! - [Signing Process](https://docs.aws.amazon.com/general/latest/gr/sigv4_signing.html)

use crate::config::Credentials;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

#[cfg(test)]
#[path = "signing_tests.rs"]
mod tests;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Hex-encoded SHA-256 of a request payload
pub fn payload_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Percent-encode a value the way SigV4 expects (RFC 3986 unreserved set)
pub fn uri_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Percent-encode an object key, keeping `/` separators intact
pub fn uri_encode_path(path: &str) -> String {
    path.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

/// The parts of an HTTP request that take part in the signature
#[derive(Debug, Clone)]
pub struct SignableRequest<'a> {
    pub method: &'a str,
    /// Host header value, including a non-default port
    pub host: &'a str,
    /// Already-encoded request path
    pub path: &'a str,
    pub query: &'a [(String, String)],
    /// Hex SHA-256 of the body
    pub payload_hash: &'a str,
}

/// AWS Signature Version 4 signer for one service in one region
#[derive(Clone)]
pub struct SigV4Signer {
    credentials: Credentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    /// Create new signer
    ///
    /// # Arguments
    ///
    /// * `credentials` - Access key, secret key and optional session token
    /// * `region` - AWS region (e.g., "us-east-2")
    /// * `service` - Signing name of the service ("sqs", "s3")
    pub fn new(credentials: Credentials, region: &str, service: &str) -> Self {
        Self {
            credentials,
            region: region.to_string(),
            service: service.to_string(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Sign a request, returning the headers to attach to it
    ///
    /// Returned headers:
    /// - `authorization`
    /// - `host`
    /// - `x-amz-content-sha256`
    /// - `x-amz-date`
    /// - `x-amz-security-token` when a session token is configured
    pub fn sign(
        &self,
        request: &SignableRequest<'_>,
        timestamp: &DateTime<Utc>,
    ) -> Vec<(String, String)> {
        let date_stamp = timestamp.format("%Y%m%d").to_string();
        let amz_date = timestamp.format("%Y%m%dT%H%M%SZ").to_string();

        // Headers must be sorted by name for both the canonical form and the
        // signed header list
        let mut headers = vec![
            ("host".to_string(), request.host.to_string()),
            (
                "x-amz-content-sha256".to_string(),
                request.payload_hash.to_string(),
            ),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(token) = self.credentials.session_token() {
            headers.push(("x-amz-security-token".to_string(), token.to_string()));
        }

        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method,
            request.path,
            canonical_query_string(request.query),
            canonical_headers,
            signed_headers,
            request.payload_hash
        );

        let credential_scope = format!(
            "{}/{}/{}/aws4_request",
            date_stamp, self.region, self.service
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            credential_scope,
            payload_hash(canonical_request.as_bytes())
        );

        let signature = hex::encode(hmac_sha256(
            &self.signing_key(&date_stamp),
            string_to_sign.as_bytes(),
        ));

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.credentials.access_key_id(),
            credential_scope,
            signed_headers,
            signature
        );

        headers.insert(0, ("authorization".to_string(), authorization));
        headers
    }

    /// Derive the signing key
    ///
    /// 1. kDate = HMAC("AWS4" + secret_key, date)
    /// 2. kRegion = HMAC(kDate, region)
    /// 3. kService = HMAC(kRegion, service)
    /// 4. kSigning = HMAC(kService, "aws4_request")
    fn signing_key(&self, date_stamp: &str) -> Vec<u8> {
        let k_secret = format!("AWS4{}", self.credentials.secret_access_key());
        let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }
}

/// Sorted, encoded query string
pub fn canonical_query_string(query: &[(String, String)]) -> String {
    let mut pairs = query
        .iter()
        .map(|(k, v)| format!("{}={}", uri_encode(k), uri_encode(v)))
        .collect::<Vec<_>>();
    pairs.sort();
    pairs.join("&")
}

/// Compute HMAC-SHA256
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
