//! OAuth 2.0 token flows.
//!
//! Each flow is one form-encoded POST to a token endpoint:
//! - **Username-Password** - Resource-owner password credentials
//! - **Web Server** - Exchange of an authorization code
//! - **Refresh Token** - New access token for an existing session
//!
//! Every request identifies itself with `User-Agent: forcelink/<api version>`.

use forcelink_client::{urls, RequestContext, Response, SfHttpClient, DEFAULT_API_VERSION};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::credentials::SalesforceCredentials;
use crate::error::{AuthError, CredentialField, Error, ErrorKind, Result};
use crate::AuthInfo;

/// Product identifier sent in the User-Agent header.
pub const PRODUCT_NAME: &str = "forcelink";

/// Client for the Salesforce token endpoints.
///
/// Holds no credentials; every flow takes its inputs as arguments.
#[derive(Debug, Clone)]
pub struct AuthenticationClient {
    http: SfHttpClient,
    api_version: String,
}

impl AuthenticationClient {
    /// Create a client with the default transport and API version.
    pub fn new() -> Result<Self> {
        Ok(Self::with_http(SfHttpClient::default_client()?))
    }

    /// Create a client over an existing transport.
    pub fn with_http(http: SfHttpClient) -> Self {
        Self {
            http,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Set the version reported in the User-Agent header and attached to
    /// issued credentials.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// The User-Agent value sent with every token request.
    pub fn user_agent(&self) -> String {
        format!("{}/{}", PRODUCT_NAME, self.api_version)
    }

    /// Run the username-password flow.
    ///
    /// Inputs are checked in order: `clientId`, `clientSecret`, `username`,
    /// `password`, `tokenEndpoint`; then the endpoint must be an absolute URL.
    #[instrument(skip(self, client_secret, password, ctx), fields(client_id = %client_id, username = %username))]
    pub async fn username_password(
        &self,
        client_id: &str,
        client_secret: &str,
        username: &str,
        password: &str,
        token_endpoint: &str,
        ctx: &RequestContext,
    ) -> Result<TokenResponse> {
        require(client_id, CredentialField::ClientId)?;
        require(client_secret, CredentialField::ClientSecret)?;
        require(username, CredentialField::Username)?;
        require(password, CredentialField::Password)?;
        require_absolute(token_endpoint, CredentialField::TokenEndpoint)?;

        let form = [
            ("grant_type", "password"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("username", username),
            ("password", password),
        ];
        let request = self.token_request(token_endpoint).form(&form[..])?;
        let response = self.http.execute(request, ctx).await?;
        self.token_response(&response, Flow::Password)
    }

    /// Run the username-password flow with the inputs from `info`.
    pub async fn login(&self, info: &AuthInfo, ctx: &RequestContext) -> Result<TokenResponse> {
        self.username_password(
            &info.client_id,
            &info.client_secret,
            &info.username,
            &info.password,
            &info.token_endpoint,
            ctx,
        )
        .await
    }

    /// Blocking form of [`username_password`](Self::username_password) for
    /// callers without an async runtime.
    ///
    /// Runs the flow on a private single-threaded runtime, on a scoped thread
    /// when called from inside a runtime. The result, success or failure, is
    /// exactly what the async flow returns.
    pub fn username_password_blocking(
        &self,
        client_id: &str,
        client_secret: &str,
        username: &str,
        password: &str,
        token_endpoint: &str,
    ) -> Result<TokenResponse> {
        let run = || -> Result<TokenResponse> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| Error::with_source(ErrorKind::Runtime(e.to_string()), e))?;
            // Pooled connections belong to the runtime that opened them.
            let client = Self {
                http: SfHttpClient::new(self.http.config().clone())?,
                api_version: self.api_version.clone(),
            };
            runtime.block_on(client.username_password(
                client_id,
                client_secret,
                username,
                password,
                token_endpoint,
                &RequestContext::new(),
            ))
        };

        if tokio::runtime::Handle::try_current().is_ok() {
            std::thread::scope(|scope| scope.spawn(run).join()).map_err(|_| {
                Error::new(ErrorKind::Runtime(
                    "authentication thread panicked".to_string(),
                ))
            })?
        } else {
            run()
        }
    }

    /// Exchange an authorization code from the web-server flow.
    ///
    /// `redirectUri` and `tokenEndpoint` must be absolute URLs.
    #[instrument(skip(self, client_secret, code, ctx), fields(client_id = %client_id))]
    pub async fn web_server(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        code: &str,
        token_endpoint: &str,
        ctx: &RequestContext,
    ) -> Result<TokenResponse> {
        require(client_id, CredentialField::ClientId)?;
        require(client_secret, CredentialField::ClientSecret)?;
        require_absolute(redirect_uri, CredentialField::RedirectUri)?;
        require(code, CredentialField::Code)?;
        require_absolute(token_endpoint, CredentialField::TokenEndpoint)?;

        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("code", code),
        ];
        let request = self.token_request(token_endpoint).form(&form[..])?;
        let response = self.http.execute(request, ctx).await?;
        self.token_response(&response, Flow::WebServer)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The parameters travel in the query string and the body is empty. The
    /// endpoint does not echo the refresh token back, so the returned
    /// response always carries the one passed in.
    #[instrument(skip(self, refresh_token, client_secret, ctx), fields(client_id = %client_id))]
    pub async fn token_refresh(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: Option<&str>,
        token_endpoint: &str,
        ctx: &RequestContext,
    ) -> Result<TokenResponse> {
        require(refresh_token, CredentialField::RefreshToken)?;
        require(client_id, CredentialField::ClientId)?;
        require_absolute(token_endpoint, CredentialField::TokenEndpoint)?;

        let url = urls::refresh_token_url(token_endpoint, refresh_token, client_id, client_secret)?;
        let request = self.token_request(url.as_str());
        let response = self.http.execute(request, ctx).await?;

        let mut token = self.token_response(&response, Flow::Refresh)?;
        token.refresh_token = Some(refresh_token.to_string());
        Ok(token)
    }

    fn token_request(&self, url: &str) -> forcelink_client::RequestBuilder {
        self.http
            .post(url)
            .header("User-Agent", self.user_agent())
            .header("Accept", "application/json")
    }

    fn token_response(&self, response: &Response, flow: Flow) -> Result<TokenResponse> {
        let status = response.status();

        if status.is_success() {
            let token: TokenResponse = serde_json::from_slice(response.bytes())?;
            info!(flow = flow.as_str(), instance_url = %token.instance_url, "Token issued");
            return Ok(token);
        }

        let error = if flow == Flow::Password && status.as_u16() == 404 {
            AuthError::new("Unknown", "Error reaching Login URL", 404)
        } else {
            match serde_json::from_slice::<OAuthErrorResponse>(response.bytes()) {
                Ok(body) => AuthError::new(body.error, body.error_description, status.as_u16()),
                Err(e) => AuthError::new("Unknown", e.to_string(), status.as_u16()),
            }
        };

        warn!(
            flow = flow.as_str(),
            status = status.as_u16(),
            error_code = %error.error_code,
            "Token request rejected"
        );
        Err(Error::new(ErrorKind::OAuth(error)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Password,
    WebServer,
    Refresh,
}

impl Flow {
    fn as_str(&self) -> &'static str {
        match self {
            Flow::Password => "password",
            Flow::WebServer => "authorization_code",
            Flow::Refresh => "refresh_token",
        }
    }
}

fn require(value: &str, field: CredentialField) -> Result<()> {
    if value.is_empty() {
        return Err(Error::missing(field));
    }
    Ok(())
}

fn require_absolute(value: &str, field: CredentialField) -> Result<()> {
    require(value, field)?;
    if !urls::is_absolute_url(value) {
        return Err(Error::malformed(field));
    }
    Ok(())
}

/// Token response from OAuth.
///
/// Sensitive fields like `access_token` and `refresh_token` are redacted
/// in Debug output to prevent accidental exposure in logs.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token (if requested).
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Instance URL. Refresh responses may omit it.
    #[serde(default)]
    pub instance_url: String,
    /// User ID URL.
    #[serde(default)]
    pub id: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Scopes granted.
    #[serde(default)]
    pub scope: Option<String>,
    /// Signature for verification.
    #[serde(default)]
    pub signature: Option<String>,
    /// Issued at timestamp.
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

impl TokenResponse {
    /// Convert to SalesforceCredentials.
    pub fn to_credentials(&self, api_version: &str) -> SalesforceCredentials {
        let mut creds =
            SalesforceCredentials::new(&self.instance_url, &self.access_token, api_version)
                .with_token_metadata(
                    self.issued_at.clone(),
                    self.signature.clone(),
                    self.token_type.clone(),
                );

        if let Some(ref rt) = self.refresh_token {
            creds = creds.with_refresh_token(rt);
        }

        creds
    }
}

/// OAuth error response.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}
