//! Buffered HTTP responses and Salesforce response-header extensions.

use std::sync::LazyLock;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// A fully-read HTTP response.
///
/// The transport reads the body inside the caller's
/// [`RequestContext`](crate::RequestContext), so by the time a `Response`
/// exists no further I/O can hang.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: String,
    body: Bytes,
}

impl Response {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, url: String, body: Bytes) -> Self {
        Self {
            status,
            headers,
            url,
            body,
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The URL the response was received from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The raw body.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns true if the body has no non-whitespace content.
    pub fn is_body_empty(&self) -> bool {
        self.body.iter().all(|b| b.is_ascii_whitespace())
    }

    /// Get API usage limits from response headers.
    pub fn api_usage(&self) -> Option<ApiUsage> {
        ApiUsage::parse(self.header("sforce-limit-info")?)
    }
}

/// API usage information from the `Sforce-Limit-Info` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiUsage {
    /// Number of API calls used.
    pub used: u64,
    /// Total API call limit.
    pub limit: u64,
}

impl ApiUsage {
    /// Parse a header value of the form `api-usage=25/15000`.
    pub fn parse(header: &str) -> Option<Self> {
        header.split(',').map(str::trim).find_map(|part| {
            let usage = part.strip_prefix("api-usage=")?;
            let (used, limit) = usage.split_once('/')?;
            Some(ApiUsage {
                used: used.trim().parse().ok()?,
                limit: limit.trim().parse().ok()?,
            })
        })
    }

    /// Get the remaining API calls.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    /// Get the usage percentage.
    pub fn percentage(&self) -> f64 {
        if self.limit == 0 {
            100.0
        } else {
            (self.used as f64 / self.limit as f64) * 100.0
        }
    }
}

/// One error record from a Salesforce error or save-result body.
///
/// Resource errors use `errorCode`; save results use `statusCode`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SalesforceError {
    #[serde(rename = "errorCode", alias = "statusCode")]
    pub error_code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

static TOKEN_PATTERN: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"00[A-Za-z0-9]{13,}[!][A-Za-z0-9_.]+").expect("valid token pattern")
});

static SESSION_PATTERN: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"sid=[A-Za-z0-9]{20,}").expect("valid session pattern")
});

/// Sanitize server-provided text before it is placed in an error message.
///
/// Redacts anything shaped like a Salesforce access token or session id and
/// truncates messages longer than 500 bytes.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = TOKEN_PATTERN
        .replace_all(message, "[REDACTED_TOKEN]")
        .to_string();
    sanitized = SESSION_PATTERN
        .replace_all(&sanitized, "sid=[REDACTED]")
        .to_string();

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
