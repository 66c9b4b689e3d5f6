//! Salesforce REST API client.
//!
//! `ForceClient` holds one authenticated session and composes the URL
//! builder, the field-policy serializer and the JSON pipeline from
//! `forcelink-client` into record, query, describe and composite
//! operations.

use forcelink_auth::{AuthInfo, AuthenticationClient, Credentials, SalesforceCredentials};
use forcelink_client::{
    urls, ClientConfig, JsonClient, RequestContext, SfHttpClient, DEFAULT_API_VERSION,
};
use tracing::{debug, info, instrument};

use crate::describe::ApiVersion;
use crate::error::{Error, ErrorKind, Result};

mod composite;
mod crud;
mod describe;
mod query;

/// Salesforce REST API client.
///
/// Provides typed methods for:
/// - CRUD and external-id upsert on SObjects
/// - SOQL queries with automatic pagination, and SOSL search
/// - Describe, versions and limits
/// - Composite batch and SObject collections
///
/// Every request runs under the client's [`RequestContext`]. The session is
/// not synchronized: [`refresh`](Self::refresh) takes `&mut self`, and
/// callers sharing a client across tasks coordinate refreshes themselves.
///
/// # Example
///
/// ```rust,ignore
/// use forcelink_auth::AuthInfo;
/// use forcelink_rest::{models::SfAccount, ForceClient};
///
/// let client = ForceClient::login(&AuthInfo::from_env()?).await?;
///
/// let account = SfAccount { name: Some("Acme".into()), ..Default::default() };
/// let created = client.create_record("Account", &account).await?;
///
/// let accounts: Vec<SfAccount> = client
///     .query("SELECT Id, Name FROM Account", false)
///     .await?;
///
/// client.delete_record("Account", &created.id).await?;
/// ```
#[derive(Clone)]
pub struct ForceClient {
    json: JsonClient,
    credentials: SalesforceCredentials,
    ctx: RequestContext,
}

impl std::fmt::Debug for ForceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForceClient")
            .field("instance_url", &self.credentials.instance_url())
            .field("api_version", &self.credentials.api_version())
            .field("access_token", &"[REDACTED]")
            .field("ctx", &self.ctx)
            .finish()
    }
}

impl ForceClient {
    /// Create a client for an existing session.
    pub fn new(
        instance_url: impl Into<String>,
        api_version: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        Self::with_config(instance_url, api_version, access_token, ClientConfig::default())
    }

    /// Create a client for an existing session with custom HTTP configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        api_version: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let credentials = SalesforceCredentials::new(instance_url, access_token, api_version);
        Ok(Self::from_credentials_with_http(
            credentials,
            SfHttpClient::new(config)?,
        ))
    }

    /// Create a client from issued credentials.
    pub fn from_credentials(credentials: SalesforceCredentials) -> Result<Self> {
        Ok(Self::from_credentials_with_http(
            credentials,
            SfHttpClient::default_client()?,
        ))
    }

    /// Create a client from issued credentials over an existing transport.
    pub fn from_credentials_with_http(
        credentials: SalesforceCredentials,
        http: SfHttpClient,
    ) -> Self {
        Self {
            json: JsonClient::with_http(http, credentials.access_token()),
            credentials,
            ctx: RequestContext::new(),
        }
    }

    /// Run every subsequent request under `ctx`.
    pub fn with_request_context(mut self, ctx: RequestContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Log in with the username-password flow.
    ///
    /// Failures are the authentication engine's errors, unchanged; see
    /// [`Error::as_auth`].
    pub async fn login(info: &AuthInfo) -> Result<Self> {
        let version = info.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION);
        let auth = AuthenticationClient::new()?.with_api_version(version);
        Self::login_with(&auth, info, RequestContext::new()).await
    }

    /// Log in with explicit username-password inputs.
    ///
    /// An empty `token_endpoint` is rejected; production orgs use
    /// [`forcelink_auth::TOKEN_REQUEST_ENDPOINT`].
    pub async fn login_password(
        client_id: &str,
        client_secret: &str,
        username: &str,
        password: &str,
        token_endpoint: &str,
    ) -> Result<Self> {
        let info = AuthInfo::new(client_id, client_secret, username, password)
            .with_token_endpoint(token_endpoint);
        Self::login(&info).await
    }

    /// Log in through `auth` and keep `ctx` for the session's requests.
    #[instrument(skip(auth, info, ctx), fields(username = %info.username))]
    pub async fn login_with(
        auth: &AuthenticationClient,
        info: &AuthInfo,
        ctx: RequestContext,
    ) -> Result<Self> {
        let token = auth.login(info, &ctx).await?;
        let credentials = token.to_credentials(auth.api_version());
        info!(instance_url = %credentials.instance_url(), "Session established");
        Ok(Self::from_credentials(credentials)?.with_request_context(ctx))
    }

    /// Replace the session with one issued for the held refresh token.
    ///
    /// The instance URL and API version are kept when the token endpoint
    /// does not return an instance URL.
    #[instrument(skip(self, auth, client_secret), fields(client_id = %client_id))]
    pub async fn refresh(
        &mut self,
        auth: &AuthenticationClient,
        client_id: &str,
        client_secret: Option<&str>,
        token_endpoint: &str,
    ) -> Result<()> {
        let refresh_token = self
            .credentials
            .refresh_token()
            .ok_or_else(|| {
                Error::new(ErrorKind::NotAuthenticated(
                    "session has no refresh token".to_string(),
                ))
            })?
            .to_string();

        let mut token = auth
            .token_refresh(
                &refresh_token,
                client_id,
                client_secret,
                token_endpoint,
                &self.ctx,
            )
            .await?;
        if token.instance_url.is_empty() {
            token.instance_url = self.instance_url().to_string();
        }

        self.credentials = token.to_credentials(self.api_version());
        self.json.set_access_token(self.credentials.access_token());
        info!("Session refreshed");
        Ok(())
    }

    pub fn credentials(&self) -> &SalesforceCredentials {
        &self.credentials
    }

    pub fn instance_url(&self) -> &str {
        self.credentials.instance_url()
    }

    pub fn api_version(&self) -> &str {
        self.credentials.api_version()
    }

    pub fn request_context(&self) -> &RequestContext {
        &self.ctx
    }

    /// Check that `instance_url` (default: the session's) answers the
    /// version list.
    ///
    /// Never fails: a malformed URL or any request failure yields `false`.
    #[instrument(skip(self))]
    pub async fn test_connection(&self, instance_url: Option<&str>) -> bool {
        let instance = instance_url.unwrap_or_else(|| self.instance_url());
        let url = match urls::versions(instance) {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "Connection test rejected URL");
                return false;
            }
        };

        match self.json.get::<Vec<ApiVersion>>(&url, &self.ctx).await {
            Ok(versions) => !versions.is_empty(),
            Err(e) => {
                debug!(error = %e, "Connection test failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forcelink_auth::CredentialField;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = ForceClient::new("https://na1.salesforce.com", "v62.0", "token123").unwrap();

        assert_eq!(client.instance_url(), "https://na1.salesforce.com");
        assert_eq!(client.api_version(), "v62.0");
        assert!(client.credentials().refresh_token().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let client =
            ForceClient::new("https://na1.salesforce.com", "v62.0", "00Dxx!secret_token").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret_token"));
        assert!(debug.contains("na1.salesforce.com"));
    }

    #[tokio::test]
    async fn test_connection_true_for_version_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"version": "62.0", "label": "Winter '25", "url": "/services/data/v62.0"}
            ])))
            .mount(&server)
            .await;

        let client = ForceClient::new(server.uri(), "v62.0", "token").unwrap();
        assert!(client.test_connection(None).await);
        assert!(client.test_connection(Some(&server.uri())).await);
    }

    #[tokio::test]
    async fn test_connection_false_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ForceClient::new(server.uri(), "v62.0", "token").unwrap();
        assert!(!client.test_connection(None).await);
        assert!(!client.test_connection(Some("malformedurl")).await);
        assert!(!client.test_connection(Some("")).await);
    }

    #[tokio::test]
    async fn test_login_errors_match_auth_engine() {
        let endpoint = "https://login.salesforce.com/services/oauth2/token";
        let cases = [
            ("", "secret", "user", "pw", endpoint, CredentialField::ClientId),
            ("cid", "", "user", "pw", endpoint, CredentialField::ClientSecret),
            ("cid", "secret", "", "pw", endpoint, CredentialField::Username),
            ("cid", "secret", "user", "", endpoint, CredentialField::Password),
            ("cid", "secret", "user", "pw", "", CredentialField::TokenEndpoint),
        ];

        let auth = AuthenticationClient::new().unwrap();
        for (cid, secret, user, pw, token_endpoint, field) in cases {
            let engine = auth
                .username_password(cid, secret, user, pw, token_endpoint, &RequestContext::new())
                .await
                .unwrap_err();
            let facade = ForceClient::login_password(cid, secret, user, pw, token_endpoint)
                .await
                .unwrap_err();

            assert_eq!(facade.to_string(), engine.to_string());
            assert_eq!(facade.as_auth().unwrap().kind, engine.kind);
            assert!(facade.to_string().contains(field.as_str()));
        }
    }

    #[tokio::test]
    async fn test_login_malformed_endpoint() {
        let err = ForceClient::login_password(
            "cid",
            "secret",
            "user",
            "pw",
            "malformed_tokenRequestEndpoint",
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.as_auth().unwrap().kind,
            forcelink_auth::ErrorKind::MalformedEndpoint(CredentialField::TokenEndpoint)
        );
        assert!(err.to_string().contains("tokenEndpoint"));
    }

    #[tokio::test]
    async fn test_login_and_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(query_param("refresh_token", "refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-2",
                "instance_url": server.uri(),
                "issued_at": "1278448384422",
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "instance_url": server.uri(),
                "issued_at": "1278448101416",
                "signature": "CMJ4l+CCaPQiKjoOEwEig9H4wqhpuLSk4J2urAe+fVg=",
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/services/data"))
            .and(header("Authorization", "Bearer access-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"version": "62.0", "label": "Winter '25", "url": "/services/data/v62.0"}
            ])))
            .mount(&server)
            .await;

        let token_endpoint = format!("{}/services/oauth2/token", server.uri());
        let info = AuthInfo::new("cid", "secret", "user", "pw")
            .with_token_endpoint(&token_endpoint)
            .with_api_version("v61.0");
        let mut client = ForceClient::login(&info).await.unwrap();
        assert_eq!(client.api_version(), "v61.0");
        assert_eq!(client.credentials().access_token(), "access-1");

        let auth = AuthenticationClient::new().unwrap();
        client
            .refresh(&auth, "cid", Some("secret"), &token_endpoint)
            .await
            .unwrap();

        assert_eq!(client.credentials().access_token(), "access-2");
        assert_eq!(client.credentials().refresh_token(), Some("refresh-1"));
        assert_eq!(client.api_version(), "v61.0");
        assert!(client.test_connection(None).await);
    }

    #[tokio::test]
    async fn test_refresh_keeps_instance_url_when_omitted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-2",
                "issued_at": "1278448384422",
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credentials =
            SalesforceCredentials::new("https://na1.salesforce.com", "access-1", "v62.0")
                .with_refresh_token("refresh-1");
        let mut client = ForceClient::from_credentials(credentials).unwrap();
        let auth = AuthenticationClient::new().unwrap();
        client
            .refresh(
                &auth,
                "cid",
                None,
                &format!("{}/services/oauth2/token", server.uri()),
            )
            .await
            .unwrap();

        assert_eq!(client.instance_url(), "https://na1.salesforce.com");
        assert_eq!(client.credentials().access_token(), "access-2");
        assert_eq!(client.credentials().refresh_token(), Some("refresh-1"));
        assert_eq!(client.api_version(), "v62.0");
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let mut client = ForceClient::new("https://na1.salesforce.com", "v62.0", "token").unwrap();
        let auth = AuthenticationClient::new().unwrap();
        let err = client
            .refresh(&auth, "cid", None, forcelink_auth::TOKEN_REQUEST_ENDPOINT)
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotAuthenticated(_)));
    }
}
