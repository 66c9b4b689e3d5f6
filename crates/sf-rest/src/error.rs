//! Error types for forcelink-rest.

/// Result type alias for forcelink-rest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for forcelink-rest operations.
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

    /// The authentication engine's error, when the failure came from a login
    /// or refresh.
    pub fn as_auth(&self) -> Option<&forcelink_auth::Error> {
        match &self.kind {
            ErrorKind::Auth(err) => Some(err),
            _ => None,
        }
    }

    /// The structured API error, when Salesforce answered with a failure or
    /// the transport failed.
    pub fn as_api_error(&self) -> Option<&forcelink_client::ApiError> {
        match &self.kind {
            ErrorKind::Client(err) => err.as_api_error(),
            _ => None,
        }
    }

    /// HTTP status of an API failure.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Client(err) => err.status(),
            ErrorKind::Auth(err) => err.as_auth_error().map(|e| e.status),
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Pipeline, URL or serialization failure.
    #[error("{0}")]
    Client(forcelink_client::Error),

    /// Login or refresh failure, displayed exactly as the auth engine does.
    #[error("{0}")]
    Auth(forcelink_auth::Error),

    /// The session has no refresh token or was never established.
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// Invalid input to a facade operation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<forcelink_client::Error> for Error {
    fn from(err: forcelink_client::Error) -> Self {
        Error::new(ErrorKind::Client(err))
    }
}

impl From<forcelink_auth::Error> for Error {
    fn from(err: forcelink_auth::Error) -> Self {
        Error::new(ErrorKind::Auth(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorKind::Client(err.into()))
    }
}
