//! Error types for forcelink-auth.
//!
//! Error messages never include credential values, only the names of the
//! fields involved.

use std::fmt;

/// Result type alias for forcelink-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for forcelink-auth operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn missing(field: CredentialField) -> Self {
        Self::new(ErrorKind::MissingCredential(field))
    }

    pub(crate) fn malformed(field: CredentialField) -> Self {
        Self::new(ErrorKind::MalformedEndpoint(field))
    }

    /// The OAuth rejection, if this error is one.
    pub fn as_auth_error(&self) -> Option<&AuthError> {
        match &self.kind {
            ErrorKind::OAuth(err) => Some(err),
            _ => None,
        }
    }
}

/// Credential inputs validated by the authentication flows.
///
/// Displays with the spelling used on the wire and in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    ClientId,
    ClientSecret,
    Username,
    Password,
    TokenEndpoint,
    RedirectUri,
    Code,
    RefreshToken,
}

impl CredentialField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialField::ClientId => "clientId",
            CredentialField::ClientSecret => "clientSecret",
            CredentialField::Username => "username",
            CredentialField::Password => "password",
            CredentialField::TokenEndpoint => "tokenEndpoint",
            CredentialField::RedirectUri => "redirectUri",
            CredentialField::Code => "code",
            CredentialField::RefreshToken => "refreshToken",
        }
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token endpoint's rejection of a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    /// The `error` field, or `Unknown` when the body could not be read.
    pub error_code: String,
    /// The `error_description` field.
    pub error_description: String,
    /// HTTP status of the rejection.
    pub status: u16,
}

impl AuthError {
    pub fn new(
        error_code: impl Into<String>,
        error_description: impl Into<String>,
        status: u16,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            error_description: error_description.into(),
            status,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OAuth error ({}): {} - {}",
            self.status, self.error_code, self.error_description
        )
    }
}

/// The kind of error that occurred.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// A required credential input was empty.
    #[error("Value cannot be null or empty (parameter '{0}')")]
    MissingCredential(CredentialField),

    /// A credential input that must be an absolute URL was not one.
    #[error("The value of '{0}' is not a well-formed absolute URL")]
    MalformedEndpoint(CredentialField),

    /// The token endpoint rejected the request.
    #[error("{0}")]
    OAuth(AuthError),

    /// Invalid input outside the credential set.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// HTTP failure reaching the token endpoint.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request deadline elapsed.
    #[error("Request timed out")]
    Timeout,

    /// Request was cancelled.
    #[error("Request cancelled")]
    Cancelled,

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Environment variable not set.
    #[error("Environment variable not set: {0}")]
    EnvVar(String),

    /// The blocking wrapper could not run the flow.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<forcelink_client::Error> for Error {
    fn from(err: forcelink_client::Error) -> Self {
        use forcelink_client::ErrorKind as ClientKind;

        let kind = match &err.kind {
            ClientKind::InvalidArgument(parameter) => ErrorKind::InvalidArgument(parameter.clone()),
            ClientKind::MalformedUrl { parameter, .. } => {
                ErrorKind::InvalidArgument(format!("malformed URL in '{}'", parameter))
            }
            ClientKind::Serialization(message) => ErrorKind::Serialization(message.clone()),
            ClientKind::Timeout => ErrorKind::Timeout,
            ClientKind::Cancelled => ErrorKind::Cancelled,
            // Transport messages have already had URLs stripped.
            _ => ErrorKind::Http(err.to_string()),
        };
        Error::with_source(kind, err)
    }
}
