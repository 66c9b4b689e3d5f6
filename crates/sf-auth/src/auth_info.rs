//! Inputs of the username-password flow.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};
use crate::TOKEN_REQUEST_ENDPOINT;

fn default_token_endpoint() -> String {
    TOKEN_REQUEST_ENDPOINT.to_string()
}

/// Connected-app and user credentials for the username-password flow.
///
/// Serialized with camelCase keys:
///
/// ```json
/// {
///   "clientId": "3MVG9...",
///   "clientSecret": "...",
///   "username": "admin@example.com",
///   "password": "passwordSECURITYTOKEN",
///   "tokenEndpoint": "https://test.salesforce.com/services/oauth2/token",
///   "apiVersion": "v62.0"
/// }
/// ```
///
/// Missing keys read as empty, so validation names the missing field.
/// `tokenEndpoint` defaults to the production login endpoint.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl std::fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInfo")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("token_endpoint", &self.token_endpoint)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl AuthInfo {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            token_endpoint: default_token_endpoint(),
            api_version: None,
        }
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Read from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read from environment variables.
    ///
    /// Required: `SF_CLIENT_ID`, `SF_CLIENT_SECRET`, `SF_USERNAME`,
    /// `SF_PASSWORD`. Optional: `SF_TOKEN_ENDPOINT`, `SF_API_VERSION`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| Error::new(ErrorKind::EnvVar(name.to_string())))
        };

        Ok(Self {
            client_id: required("SF_CLIENT_ID")?,
            client_secret: required("SF_CLIENT_SECRET")?,
            username: required("SF_USERNAME")?,
            password: required("SF_PASSWORD")?,
            token_endpoint: lookup("SF_TOKEN_ENDPOINT").unwrap_or_else(default_token_endpoint),
            api_version: lookup("SF_API_VERSION"),
        })
    }
}
