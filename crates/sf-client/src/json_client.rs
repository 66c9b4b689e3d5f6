//! Authenticated JSON request pipeline.
//!
//! [`JsonClient`] attaches the bearer token to every request, sends it through
//! [`SfHttpClient`], and turns the response into either a typed value or an
//! [`ApiError`]:
//!
//! | Response                                   | Result                                   |
//! |--------------------------------------------|------------------------------------------|
//! | 204, or 2xx with `deserialize_response` off | `T::default()`, body ignored             |
//! | 2xx with empty body                        | `ApiError("Response content was empty")` |
//! | 2xx                                        | body parsed as `T`                       |
//! | 300                                        | `ApiError` carrying the candidate URLs   |
//! | anything else                              | `ApiError` carrying the parsed errors    |
//!
//! ## Security
//!
//! - The access token is redacted in Debug output
//! - Salesforce error text is sanitized before it lands in an error message

use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::client::SfHttpClient;
use crate::context::RequestContext;
use crate::error::{ApiError, Error, ErrorKind, Result};
use crate::policy::{FieldPolicies, SerializationMode};
use crate::request::{RequestBuilder, RequestMethod};
use crate::response::{sanitize_error_message, Response, SalesforceError};
use crate::serializer;

/// Message of the error raised for an ambiguous external-id upsert.
pub const MULTIPLE_MATCHES_MESSAGE: &str =
    "Multiple matches for External ID value, see ObjectUrls";

/// Message of the error raised for a 2xx response with no body.
pub const EMPTY_CONTENT_MESSAGE: &str = "Response content was empty";

/// JSON client bound to one access token.
///
/// Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct JsonClient {
    http: SfHttpClient,
    access_token: String,
}

impl std::fmt::Debug for JsonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonClient")
            .field("http", &self.http)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl JsonClient {
    /// Create a client with the default transport configuration.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Ok(Self::with_http(SfHttpClient::default_client()?, access_token))
    }

    /// Create a client over an existing transport.
    pub fn with_http(http: SfHttpClient, access_token: impl Into<String>) -> Self {
        Self {
            http,
            access_token: access_token.into(),
        }
    }

    pub fn http(&self) -> &SfHttpClient {
        &self.http
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Replace the token used for subsequent requests.
    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = access_token.into();
    }

    /// Send `request` with the bearer token and interpret the response.
    #[instrument(skip(self, request, ctx), fields(method = ?request.method()))]
    pub async fn execute<T>(
        &self,
        request: RequestBuilder,
        deserialize_response: bool,
        ctx: &RequestContext,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let response = self.send(request, ctx).await?;
        interpret(&response, deserialize_response)
    }

    /// Send a request with an optional pre-serialized JSON body and extra
    /// headers.
    pub async fn send_json<T>(
        &self,
        method: RequestMethod,
        url: &Url,
        body: Option<String>,
        headers: &[(&str, &str)],
        deserialize_response: bool,
        ctx: &RequestContext,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let mut request = RequestBuilder::new(method, url.as_str());
        if let Some(body) = body {
            request = request.json_text(body);
        }
        request = request.headers(headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self.execute(request, deserialize_response, ctx).await
    }

    /// GET `url` and parse the body as `T`.
    pub async fn get<T>(&self, url: &Url, ctx: &RequestContext) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        self.execute(self.http.get(url.as_str()), true, ctx).await
    }

    /// POST `body` serialized in create mode.
    pub async fn post<T, B>(&self, url: &Url, body: &B, ctx: &RequestContext) -> Result<T>
    where
        T: DeserializeOwned + Default,
        B: FieldPolicies + Serialize + ?Sized,
    {
        let body = serializer::serialize_for_create(body)?;
        self.execute(self.http.post(url.as_str()).json_text(body), true, ctx)
            .await
    }

    /// PATCH `body` serialized in `mode`.
    pub async fn patch<T, B>(
        &self,
        url: &Url,
        body: &B,
        mode: SerializationMode,
        ctx: &RequestContext,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default,
        B: FieldPolicies + Serialize + ?Sized,
    {
        let body = serde_json::to_string(&serializer::to_value(body, mode)?)?;
        self.execute(self.http.patch(url.as_str()).json_text(body), true, ctx)
            .await
    }

    /// DELETE `url`, ignoring any response body.
    pub async fn delete(&self, url: &Url, ctx: &RequestContext) -> Result<()> {
        self.execute(self.http.delete(url.as_str()), false, ctx)
            .await
    }

    /// GET `url` and return the raw body, for blob fields.
    pub async fn get_bytes(&self, url: &Url, ctx: &RequestContext) -> Result<Bytes> {
        let response = self.send(self.http.get(url.as_str()), ctx).await?;
        if response.is_success() {
            Ok(response.bytes().clone())
        } else {
            Err(status_error(&response))
        }
    }

    async fn send(&self, request: RequestBuilder, ctx: &RequestContext) -> Result<Response> {
        let request = request.bearer_auth(&self.access_token);
        let response = self.http.execute(request, ctx).await?;
        if let Some(usage) = response.api_usage() {
            debug!(
                used = usage.used,
                limit = usage.limit,
                remaining = usage.remaining(),
                "API usage"
            );
        }
        Ok(response)
    }
}

// ============================================================================
// Response interpretation
// ============================================================================

fn api_error(message: impl Into<String>, status: StatusCode) -> Error {
    Error::new(ErrorKind::Api(
        ApiError::new(message).with_status(status.as_u16()),
    ))
}

/// Map a buffered response to `T` or an [`ApiError`].
pub fn interpret<T>(response: &Response, deserialize_response: bool) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let status = response.status();

    if status == StatusCode::NO_CONTENT || (status.is_success() && !deserialize_response) {
        return Ok(T::default());
    }

    if status.is_success() {
        if response.is_body_empty() {
            return Err(api_error(EMPTY_CONTENT_MESSAGE, status));
        }
        return serde_json::from_slice(response.bytes()).map_err(|e| {
            Error::with_source(
                ErrorKind::Api(
                    ApiError::new(format!("Error parsing response content: {}", e))
                        .with_status(status.as_u16()),
                ),
                e,
            )
        });
    }

    if status == StatusCode::MULTIPLE_CHOICES {
        return Err(multiple_choices_error(response));
    }

    Err(status_error(response))
}

fn multiple_choices_error(response: &Response) -> Error {
    let status = response.status();
    if response.is_body_empty() {
        return api_error(EMPTY_CONTENT_MESSAGE, status);
    }
    match serde_json::from_slice::<Vec<String>>(response.bytes()) {
        Ok(object_urls) => {
            let mut error = ApiError::new(MULTIPLE_MATCHES_MESSAGE).with_status(status.as_u16());
            error.object_urls = object_urls;
            Error::new(ErrorKind::Api(error))
        }
        Err(e) => Error::with_source(
            ErrorKind::Api(
                ApiError::new(format!(
                    "{} Unable to parse object URLs: {}",
                    MULTIPLE_MATCHES_MESSAGE, e
                ))
                .with_status(status.as_u16()),
            ),
            e,
        ),
    }
}

/// Salesforce usually returns a list of errors; a few endpoints return one.
fn parse_errors(body: &[u8]) -> std::result::Result<Vec<SalesforceError>, serde_json::Error> {
    serde_json::from_slice::<Vec<SalesforceError>>(body)
        .or_else(|e| serde_json::from_slice::<SalesforceError>(body).map(|one| vec![one]).map_err(|_| e))
}

fn status_error(response: &Response) -> Error {
    let status = response.status();
    let mut error = ApiError::new(format!(
        "Unable to complete request, Salesforce API returned {}.",
        status
    ))
    .with_status(status.as_u16());

    match parse_errors(response.bytes()) {
        Ok(errors) => {
            if let Some(first) = errors.first() {
                error.message.push_str(&format!(
                    " ErrorCode {}: {}.",
                    first.error_code,
                    sanitize_error_message(&first.message)
                ));
                error.error_code = Some(first.error_code.clone());
            }
            if errors.len() > 1 {
                error
                    .message
                    .push_str(" Additional errors returned, see errors for complete list.");
            }
            error.errors = errors;
        }
        Err(e) => {
            error
                .message
                .push_str(&format!(" Unable to parse error details: {}", e));
        }
    }

    Error::new(ErrorKind::Api(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Record {
        #[serde(rename = "Name")]
        name: String,
    }

    fn response(status: u16, body: &str) -> Response {
        Response::new(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            "https://na1.salesforce.com/services/data/v62.0/sobjects/Account".to_string(),
            Bytes::from(body.to_string()),
        )
    }

    fn api(err: Error) -> ApiError {
        match err.kind {
            ErrorKind::Api(api) => api,
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_no_content_yields_default() {
        let value: Record = interpret(&response(204, ""), true).unwrap();
        assert_eq!(value, Record::default());
    }

    #[test]
    fn test_skip_deserialization_yields_default() {
        let value: Record = interpret(&response(200, "not json"), false).unwrap();
        assert_eq!(value, Record::default());
    }

    #[test]
    fn test_empty_success_body_is_an_error() {
        let err = api(interpret::<Record>(&response(200, ""), true).unwrap_err());
        assert_eq!(err.message, EMPTY_CONTENT_MESSAGE);
        assert_eq!(err.status, Some(200));
    }

    #[test]
    fn test_success_body_is_parsed() {
        let value: Record = interpret(&response(200, r#"{"Name":"Acme"}"#), true).unwrap();
        assert_eq!(value.name, "Acme");

        let err = api(interpret::<Record>(&response(200, "{"), true).unwrap_err());
        assert!(err.message.starts_with("Error parsing response content:"));
    }

    #[test]
    fn test_multiple_choices_carries_object_urls() {
        let body = r#"["url1","url2"]"#;
        let err = api(interpret::<Record>(&response(300, body), true).unwrap_err());
        assert_eq!(err.message, MULTIPLE_MATCHES_MESSAGE);
        assert_eq!(err.object_urls, vec!["url1".to_string(), "url2".to_string()]);
        assert_eq!(err.status, Some(300));

        let err = api(interpret::<Record>(&response(300, ""), true).unwrap_err());
        assert_eq!(err.message, EMPTY_CONTENT_MESSAGE);
    }

    #[test]
    fn test_error_list_is_parsed() {
        let body = r#"[{"errorCode":"INVALID_FIELD","message":"bad field"}]"#;
        let err = api(interpret::<Record>(&response(400, body), true).unwrap_err());
        assert!(err.message.contains("ErrorCode INVALID_FIELD: bad field."));
        assert!(err.message.starts_with(
            "Unable to complete request, Salesforce API returned 400 Bad Request."
        ));
        assert!(!err.message.contains("Additional errors"));
        assert_eq!(err.status, Some(400));
        assert_eq!(err.error_code.as_deref(), Some("INVALID_FIELD"));
        assert_eq!(err.errors.len(), 1);
    }

    #[test]
    fn test_additional_errors_are_noted() {
        let body = json!([
            {"errorCode": "REQUIRED_FIELD_MISSING", "message": "Required fields are missing: [Name]", "fields": ["Name"]},
            {"errorCode": "INVALID_FIELD", "message": "bad field"}
        ])
        .to_string();
        let err = api(interpret::<Record>(&response(400, &body), true).unwrap_err());
        assert!(err.message.contains("ErrorCode REQUIRED_FIELD_MISSING"));
        assert!(err.message.contains("Additional errors returned"));
        assert_eq!(err.errors.len(), 2);
        assert_eq!(err.errors[0].fields, vec!["Name".to_string()]);
    }

    #[test]
    fn test_unparseable_error_body_keeps_status() {
        let err = api(interpret::<Record>(&response(500, "<html>oops</html>"), true).unwrap_err());
        assert!(err.message.contains("500 Internal Server Error"));
        assert!(err.message.contains("Unable to parse error details:"));
        assert_eq!(err.status, Some(500));
        assert!(err.errors.is_empty());
    }

    #[test]
    fn test_single_error_object_is_accepted() {
        let body = r#"{"errorCode":"NOT_FOUND","message":"The requested resource does not exist"}"#;
        let err = api(interpret::<Record>(&response(404, body), true).unwrap_err());
        assert_eq!(err.error_code.as_deref(), Some("NOT_FOUND"));
    }

    #[test]
    fn test_error_text_is_sanitized() {
        let body = json!([{
            "errorCode": "INVALID_SESSION_ID",
            "message": "Session expired for 00Dxx0000001gEF!AQcAQH3k9s7LKbp_secret_value"
        }])
        .to_string();
        let err = api(interpret::<Record>(&response(401, &body), true).unwrap_err());
        assert!(!err.message.contains("AQcAQH3k9s7LKbp"));
        assert!(err.message.contains("[REDACTED_TOKEN]"));
    }

    #[tokio::test]
    async fn test_execute_attaches_bearer_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/sobjects/Account/001xx"))
            .and(header("Authorization", "Bearer 00Dxx!token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Sforce-Limit-Info", "api-usage=5/15000")
                    .set_body_json(json!({"Name": "Acme"})),
            )
            .mount(&mock_server)
            .await;

        let client = JsonClient::new("00Dxx!token").unwrap();
        let url = Url::parse(&format!(
            "{}/services/data/v62.0/sobjects/Account/001xx",
            mock_server.uri()
        ))
        .unwrap();
        let record: Record = client.get(&url, &RequestContext::new()).await.unwrap();
        assert_eq!(record.name, "Acme");
    }

    #[tokio::test]
    async fn test_patch_uses_requested_mode() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/record"))
            .and(body_string(r#"{"Name":"Acme"}"#))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = JsonClient::new("token").unwrap();
        let url = Url::parse(&format!("{}/record", mock_server.uri())).unwrap();
        let body = json!({"Id": "001xx", "Name": "Acme", "Phone": null});
        let () = client
            .patch(&url, &body, SerializationMode::Update, &RequestContext::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_json_with_custom_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/composite"))
            .and(header("Sforce-Duplicate-Rule-Header", "allowSave=true"))
            .and(body_string("[]"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&mock_server)
            .await;

        let client = JsonClient::new("token").unwrap();
        let url = Url::parse(&format!("{}/composite", mock_server.uri())).unwrap();
        let result: Vec<serde_json::Value> = client
            .send_json(
                RequestMethod::Post,
                &url,
                Some("[]".to_string()),
                &[("Sforce-Duplicate-Rule-Header", "allowSave=true")],
                true,
                &RequestContext::new(),
            )
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_api_error() {
        let client = JsonClient::new("token").unwrap();
        let url = Url::parse("http://127.0.0.1:1/services/data").unwrap();
        let err = client
            .get::<serde_json::Value>(&url, &RequestContext::new())
            .await
            .unwrap_err();
        assert!(err.as_api_error().is_some());
        assert!(!err.to_string().contains("token"));
    }

    #[tokio::test]
    async fn test_get_bytes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/blob"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8, 1, 2, 255]))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!([
                {"errorCode": "NOT_FOUND", "message": "The requested resource does not exist"}
            ])))
            .mount(&mock_server)
            .await;

        let client = JsonClient::new("token").unwrap();
        let ctx = RequestContext::new();

        let url = Url::parse(&format!("{}/blob", mock_server.uri())).unwrap();
        let bytes = client.get_bytes(&url, &ctx).await.unwrap();
        assert_eq!(bytes.as_ref(), &[0u8, 1, 2, 255]);

        let url = Url::parse(&format!("{}/missing", mock_server.uri())).unwrap();
        let err = client.get_bytes(&url, &ctx).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = JsonClient::new("super-secret").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
