//! HTTP request building.

use serde::Serialize;

use crate::error::{Error, ErrorKind, Result};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A single outbound request: method, URL, headers and optional body.
///
/// Built per call and consumed by [`SfHttpClient::execute`](crate::SfHttpClient::execute).
#[derive(Debug)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) bearer_token: Option<String>,
}

/// Request body content, already encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Json(String),
    Form(String),
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            bearer_token: None,
        }
    }

    /// Set the bearer token for authentication.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Add a header. A later header with the same name replaces an earlier one.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Add every header in `headers`.
    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self = self.header(name, value);
        }
        self
    }

    /// Set an already-serialized JSON body.
    pub fn json_text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Json(body.into()));
        self.header("Content-Type", "application/json")
    }

    /// Set a form-urlencoded body from key/value pairs.
    pub fn form<T: Serialize + ?Sized>(mut self, data: &T) -> Result<Self> {
        let encoded = serde_urlencoded::to_string(data).map_err(|e| {
            Error::with_source(ErrorKind::Serialization(e.to_string()), e)
        })?;
        self.body = Some(RequestBody::Form(encoded));
        Ok(self.header("Content-Type", "application/x-www-form-urlencoded"))
    }

    /// Get the request method.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// Get the request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get a header value by case-insensitive name.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get the request body.
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }
}
