//! Core HTTP transport.

use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::context::RequestContext;
use crate::error::{ApiError, Error, ErrorKind, Result};
use crate::request::{RequestBody, RequestBuilder, RequestMethod};
use crate::response::Response;

/// HTTP transport shared by every Salesforce call.
///
/// Cloning is cheap and clones share one connection pool, so a single
/// instance can serve any number of concurrent calls. Nothing here retries.
#[derive(Debug, Clone)]
pub struct SfHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl SfHttpClient {
    /// Create a new HTTP client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, url)
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, url)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Patch, url)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Delete, url)
    }

    /// Send a request and read the full response body.
    ///
    /// Any status is returned as `Ok`; interpreting it is the caller's job.
    /// Transport failures come back as [`ErrorKind::Api`] with no status.
    #[instrument(skip(self, request, ctx), fields(method = ?request.method, url = %loggable_url(&request.url)))]
    pub async fn execute(&self, request: RequestBuilder, ctx: &RequestContext) -> Result<Response> {
        ctx.run(self.execute_once(request)).await
    }

    async fn execute_once(&self, request: RequestBuilder) -> Result<Response> {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), &request.url);

        if let Some(ref token) = request.bearer_token {
            req = req.bearer_auth(token);
        }

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            req = match body {
                RequestBody::Json(text) | RequestBody::Form(text) => req.body(text),
            };
        }

        if self.config.enable_tracing {
            debug!(method = ?request.method, url = %loggable_url(&request.url), "Sending request");
        }

        let response = req.send().await.map_err(transport_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().to_string();

        if self.config.enable_tracing {
            if status.is_success() {
                debug!(status = status.as_u16(), "Response received");
            } else {
                info!(status = status.as_u16(), "Non-success response");
            }
        }

        let body = response.bytes().await.map_err(|e| {
            let message = format!(
                "Error processing response: returned {} for {}: {}",
                status.canonical_reason().unwrap_or("no reason phrase"),
                loggable_url(&url),
                e
            );
            Error::with_source(
                ErrorKind::Api(ApiError::new(message).with_status(status.as_u16())),
                e,
            )
        })?;

        Ok(Response::new(status, headers, url, body))
    }
}

/// The URL without its query string, which may carry credentials.
fn loggable_url(url: &str) -> &str {
    url.split('?').next().unwrap_or_default()
}

/// Rewrap a reqwest failure as an API error carrying the underlying message
/// and, when present, the message of its cause. The URL is stripped since it
/// may carry a refresh token in its query.
fn transport_error(err: reqwest::Error) -> Error {
    let err = err.without_url();
    let mut message = format!("Error sending HTTP request: {}", err);
    if let Some(inner) = std::error::Error::source(&err) {
        let inner = inner.to_string();
        if !message.contains(&inner) {
            message.push(' ');
            message.push_str(&inner);
        }
    }
    Error::with_source(ErrorKind::Api(ApiError::new(message)), err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_creation() {
        let client = SfHttpClient::default_client().unwrap();
        assert!(client.config().accept_compressed);
    }

    #[tokio::test]
    async fn test_successful_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/test"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true
            })))
            .mount(&mock_server)
            .await;

        let client = SfHttpClient::default_client().unwrap();
        let response = client
            .execute(
                client
                    .get(format!("{}/test", mock_server.uri()))
                    .bearer_auth("test-token"),
                &RequestContext::new(),
            )
            .await
            .unwrap();

        assert!(response.is_success());
        assert!(response.text().contains("success"));
    }

    #[tokio::test]
    async fn test_error_status_is_not_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(400).set_body_string("[]"))
            .mount(&mock_server)
            .await;

        let client = SfHttpClient::default_client().unwrap();
        let response = client
            .execute(
                client.get(format!("{}/error", mock_server.uri())),
                &RequestContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400);
        assert_eq!(response.text(), "[]");
    }

    #[tokio::test]
    async fn test_server_error_is_sent_once() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = SfHttpClient::default_client().unwrap();
        let response = client
            .execute(
                client.get(format!("{}/flaky", mock_server.uri())),
                &RequestContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 503);
    }

    #[tokio::test]
    async fn test_body_and_headers_are_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/records/1"))
            .and(header("Content-Type", "application/json"))
            .and(header("Sforce-Auto-Assign", "FALSE"))
            .and(body_string(r#"{"Name":"Acme"}"#))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let client = SfHttpClient::default_client().unwrap();
        let response = client
            .execute(
                client
                    .patch(format!("{}/records/1", mock_server.uri()))
                    .header("Sforce-Auto-Assign", "FALSE")
                    .json_text(r#"{"Name":"Acme"}"#),
                &RequestContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 204);
    }

    #[tokio::test]
    async fn test_transport_failure_is_api_error() {
        // Nothing listens on port 1.
        let client = SfHttpClient::default_client().unwrap();
        let err = client
            .execute(client.get("http://127.0.0.1:1/"), &RequestContext::new())
            .await
            .unwrap_err();

        let api = err.as_api_error().expect("transport failures are API errors");
        assert!(api.message.starts_with("Error sending HTTP request:"));
        assert_eq!(api.status, None);
        assert!(err.source.is_some());
    }

    #[tokio::test]
    async fn test_context_deadline_bounds_the_exchange() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&mock_server)
            .await;

        let client = SfHttpClient::default_client().unwrap();
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let err = client
            .execute(client.get(format!("{}/slow", mock_server.uri())), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Timeout));
    }
}
