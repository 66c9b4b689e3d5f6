//! Credentials trait and implementations.
//!
//! All credential types implement custom Debug to redact sensitive data.

use forcelink_client::DEFAULT_API_VERSION;

use crate::error::{Error, ErrorKind, Result};

/// Trait for Salesforce credentials.
pub trait Credentials: Send + Sync {
    /// Get the Salesforce instance URL.
    fn instance_url(&self) -> &str;

    /// Get the access token.
    fn access_token(&self) -> &str;

    /// Get the API version (e.g., "v62.0").
    fn api_version(&self) -> &str;

    /// Returns true if the credentials appear to be valid (non-empty).
    fn is_valid(&self) -> bool {
        !self.instance_url().is_empty() && !self.access_token().is_empty()
    }
}

/// An authenticated Salesforce session.
///
/// Issued by a successful authentication flow and replaced wholesale on
/// refresh. Tokens and the signature are redacted in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct SalesforceCredentials {
    instance_url: String,
    access_token: String,
    api_version: String,
    refresh_token: Option<String>,
    issued_at: Option<String>,
    signature: Option<String>,
    token_type: Option<String>,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceCredentials")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("issued_at", &self.issued_at)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("token_type", &self.token_type)
            .finish()
    }
}

impl SalesforceCredentials {
    /// Create new credentials with the given values.
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            api_version: api_version.into(),
            refresh_token: None,
            issued_at: None,
            signature: None,
            token_type: None,
        }
    }

    /// Create credentials with a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Attach the token metadata returned by the token endpoint.
    pub fn with_token_metadata(
        mut self,
        issued_at: Option<String>,
        signature: Option<String>,
        token_type: Option<String>,
    ) -> Self {
        self.issued_at = issued_at;
        self.signature = signature;
        self.token_type = token_type;
        self
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Get the refresh token if available.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Milliseconds since the epoch at which the token was issued, as sent.
    pub fn issued_at(&self) -> Option<&str> {
        self.issued_at.as_deref()
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Token type, usually `Bearer`.
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    /// Load a ready-made session from environment variables.
    ///
    /// Required environment variables:
    /// - `SF_INSTANCE_URL`
    /// - `SF_ACCESS_TOKEN`
    ///
    /// Optional:
    /// - `SF_API_VERSION` (default: [`DEFAULT_API_VERSION`])
    /// - `SF_REFRESH_TOKEN`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let instance_url = lookup("SF_INSTANCE_URL")
            .ok_or_else(|| Error::new(ErrorKind::EnvVar("SF_INSTANCE_URL".to_string())))?;

        let access_token = lookup("SF_ACCESS_TOKEN")
            .ok_or_else(|| Error::new(ErrorKind::EnvVar("SF_ACCESS_TOKEN".to_string())))?;

        let api_version =
            lookup("SF_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let mut creds = Self::new(instance_url, access_token, api_version);
        if let Some(rt) = lookup("SF_REFRESH_TOKEN") {
            creds = creds.with_refresh_token(rt);
        }

        Ok(creds)
    }
}

impl Credentials for SalesforceCredentials {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}
