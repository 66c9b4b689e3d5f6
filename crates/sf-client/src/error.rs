//! Error types for forcelink-client.

use crate::response::SalesforceError;

/// Result type alias for forcelink-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for forcelink-client operations.
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

    /// Shorthand for a missing or empty required argument.
    pub fn invalid_argument(parameter: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(parameter.into()))
    }

    /// Returns the API error details if this error came from a resource call.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match &self.kind {
            ErrorKind::Api(api) => Some(api),
            _ => None,
        }
    }

    /// HTTP status of the failed call, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        self.as_api_error().and_then(|api| api.status)
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// A required input was missing or empty. Carries the parameter name.
    #[error("Value cannot be null or empty (parameter '{0}')")]
    InvalidArgument(String),

    /// An input that must be an absolute URL was not one.
    #[error("Malformed URL in '{parameter}': {reason}")]
    MalformedUrl { parameter: String, reason: String },

    /// A resource call failed: transport error, non-2xx status, or unusable body.
    #[error("{0}")]
    Api(ApiError),

    /// The outbound object graph could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON error outside the response pipeline.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request deadline passed before the exchange completed.
    #[error("Request timeout")]
    Timeout,

    /// The caller's cancellation signal fired.
    #[error("Request cancelled")]
    Cancelled,
}

/// A failed Salesforce resource call.
///
/// `message` is the complete human-readable summary; the remaining fields
/// carry whatever structure could be recovered from the response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiError {
    pub message: String,
    /// HTTP status, absent for transport failures.
    pub status: Option<u16>,
    /// Error code of the first parsed error record.
    pub error_code: Option<String>,
    /// Candidate record URLs of an ambiguous external-id upsert (HTTP 300).
    pub object_urls: Vec<String>,
    /// Every error record parsed from the body.
    pub errors: Vec<SalesforceError>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::new(ErrorKind::Api(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_message_only() {
        let err = Error::from(
            ApiError::new("Unable to complete request, Salesforce API returned 400 Bad Request.")
                .with_status(400),
        );
        assert_eq!(
            err.to_string(),
            "Unable to complete request, Salesforce API returned 400 Bad Request."
        );
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_error_kind_display_messages() {
        let cases: Vec<(ErrorKind, &str)> = vec![
            (
                ErrorKind::InvalidArgument("instance_url".into()),
                "parameter 'instance_url'",
            ),
            (
                ErrorKind::MalformedUrl {
                    parameter: "login_url".into(),
                    reason: "relative URL without a base".into(),
                },
                "Malformed URL in 'login_url'",
            ),
            (
                ErrorKind::Serialization("maximum depth exceeded".into()),
                "Serialization error: maximum depth exceeded",
            ),
            (ErrorKind::Json("EOF".into()), "JSON error: EOF"),
            (
                ErrorKind::Config("bad pool".into()),
                "Configuration error: bad pool",
            ),
            (ErrorKind::Timeout, "Request timeout"),
            (ErrorKind::Cancelled, "Request cancelled"),
        ];

        for (kind, expected_substring) in cases {
            let display = kind.to_string();
            assert!(
                display.contains(expected_substring),
                "Expected '{display}' to contain '{expected_substring}'"
            );
        }
    }

    #[test]
    fn test_non_api_errors_have_no_status() {
        let err = Error::invalid_argument("api_version");
        assert!(err.as_api_error().is_none());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("not valid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err.kind, ErrorKind::Json(_)));
        assert!(err.source.is_some());
    }
}
