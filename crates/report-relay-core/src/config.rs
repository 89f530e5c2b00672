//! Client configuration shared by the dispatcher and the retriever.
//!
//! A [`RelayConfig`] is built once by the caller (usually the CLI, from a
//! credentials file and the process environment) and handed to the service
//! providers. Nothing in this crate reads ambient process state.

use crate::error::ConfigurationError;
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Region used when the configuration source does not name one
pub const DEFAULT_REGION: &str = "us-east-2";

/// Default timeout applied to every HTTP request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Static access credentials
///
/// The secret key is wiped from memory when the credentials are dropped and
/// is never printed by `Debug`.
#[derive(Clone)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: Zeroizing<String>,
    session_token: Option<Zeroizing<String>>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: Zeroizing::new(secret_access_key.into()),
            session_token: None,
        }
    }

    /// Attach a temporary session token
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(Zeroizing::new(token.into()));
        self
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        self.secret_access_key.as_str()
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_ref().map(|t| t.as_str())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Configuration for the queue service and object store clients
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Region hosting both the queue and the bucket (e.g. "us-east-2")
    pub region: String,

    pub credentials: Credentials,

    /// Custom endpoint for both services (LocalStack, MinIO, ...)
    ///
    /// When set, object URLs use path-style addressing.
    pub endpoint_url: Option<String>,

    pub request_timeout: Duration,
}

impl RelayConfig {
    pub fn new(region: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            region: region.into(),
            credentials,
            endpoint_url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build a configuration from loaded settings, rejecting missing credentials
    pub fn from_settings(settings: CredentialSettings) -> Result<Self, ConfigurationError> {
        let access_key_id = settings
            .aws_access_key_id
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigurationError::Missing {
                key: "AWS_ACCESS_KEY_ID".to_string(),
            })?;
        let secret_access_key = settings
            .aws_secret_access_key
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigurationError::Missing {
                key: "AWS_SECRET_ACCESS_KEY".to_string(),
            })?;

        let mut credentials = Credentials::new(access_key_id, secret_access_key);
        if let Some(token) = settings.aws_session_token.filter(|t| !t.trim().is_empty()) {
            credentials = credentials.with_session_token(token);
        }

        let region = settings
            .aws_default_region
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut config = Self::new(region, credentials);
        if let Some(endpoint) = settings.aws_endpoint_url.filter(|e| !e.trim().is_empty()) {
            config = config.with_endpoint_url(endpoint);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can be used to build service clients
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.region.trim().is_empty() {
            return Err(ConfigurationError::Invalid {
                message: "region cannot be empty".to_string(),
            });
        }

        if !self
            .region
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ConfigurationError::Invalid {
                message: format!("region '{}' contains invalid characters", self.region),
            });
        }

        if let Some(endpoint) = &self.endpoint_url {
            let parsed = url::Url::parse(endpoint).map_err(|e| ConfigurationError::Invalid {
                message: format!("endpoint url '{}' is not valid: {}", endpoint, e),
            })?;
            if parsed.host_str().is_none() {
                return Err(ConfigurationError::Invalid {
                    message: format!("endpoint url '{}' has no host", endpoint),
                });
            }
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigurationError::Invalid {
                message: "request timeout must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Raw settings as read from a credentials file and the environment
///
/// Field names are the lower-cased variable names (`aws_access_key_id`, ...).
#[derive(Clone, Default)]
pub struct CredentialSettings {
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    pub aws_default_region: Option<String>,
    pub aws_endpoint_url: Option<String>,
}

impl CredentialSettings {
    /// Collect settings from `KEY=value` pairs
    ///
    /// Keys are matched case-insensitively and a later pair overrides an
    /// earlier one, so sources should be chained lowest priority first.
    /// Unrecognised keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut settings = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref().trim().to_ascii_lowercase().as_str() {
                "aws_access_key_id" => &mut settings.aws_access_key_id,
                "aws_secret_access_key" => &mut settings.aws_secret_access_key,
                "aws_session_token" => &mut settings.aws_session_token,
                "aws_default_region" => &mut settings.aws_default_region,
                "aws_endpoint_url" => &mut settings.aws_endpoint_url,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        settings
    }
}
