//! # forcelink-auth
//!
//! Salesforce OAuth 2.0 token flows.
//!
//! ## Security
//!
//! - Sensitive data (tokens, secrets, passwords) are redacted in Debug output
//! - Tracing skips credential parameters
//! - Error messages name the offending field, never its value
//!
//! ## Supported Authentication Methods
//!
//! - **Username-Password Flow** - Resource-owner password credentials, with a
//!   blocking wrapper for callers without an async runtime
//! - **Web Server Flow** - Authorization code exchange
//! - **Refresh Token** - For refreshing expired access tokens
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcelink_auth::{AuthInfo, AuthenticationClient};
//! use forcelink_client::RequestContext;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), forcelink_auth::Error> {
//!     let info = AuthInfo::from_env()?;
//!     let client = AuthenticationClient::new()?;
//!     let token = client.login(&info, &RequestContext::new()).await?;
//!     let creds = token.to_credentials(client.api_version());
//!     Ok(())
//! }
//! ```

mod auth_info;
mod authentication;
mod credentials;
mod error;

pub use auth_info::AuthInfo;
pub use authentication::{AuthenticationClient, TokenResponse, PRODUCT_NAME};
pub use credentials::{Credentials, SalesforceCredentials};
pub use error::{AuthError, CredentialField, Error, ErrorKind, Result};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";

/// Default token endpoint of the username-password flow.
pub const TOKEN_REQUEST_ENDPOINT: &str = "https://login.salesforce.com/services/oauth2/token";
