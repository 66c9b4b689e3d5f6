//! # forcelink
//!
//! A Salesforce REST API client for Rust.
//!
//! This library provides OAuth authentication flows, resource URL
//! construction, field-policy aware JSON serialization and a typed
//! request pipeline, composed into a single `ForceClient` facade.
//!
//! ## Security
//!
//! - Sensitive data (tokens, secrets, passwords) is redacted in Debug output
//! - Tracing skips credential parameters
//! - Server-provided error text is sanitized before it reaches an error message
//!
//! ## Crates
//!
//! - **forcelink-client** - Resource URLs, field-policy serializer, JSON pipeline, transport
//! - **forcelink-auth** - OAuth flows: username-password, web server, refresh token
//! - **forcelink-rest** - `ForceClient`: CRUD, query, search, describe, composite
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forcelink::{AuthInfo, ForceClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ForceClient::login(&AuthInfo::from_env()?).await?;
//!
//!     let accounts: Vec<serde_json::Value> = client
//!         .query("SELECT Id, Name FROM Account LIMIT 10", false)
//!         .await?;
//!
//!     for account in accounts {
//!         println!("{}", account["Name"]);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "auth")]
pub use forcelink_auth as auth;
#[cfg(feature = "client")]
pub use forcelink_client as client;
#[cfg(feature = "rest")]
pub use forcelink_rest as rest;

// Re-export commonly used types at the top level
#[cfg(feature = "auth")]
pub use forcelink_auth::{AuthInfo, AuthenticationClient, Credentials, SalesforceCredentials};
#[cfg(feature = "client")]
pub use forcelink_client::{ClientConfig, RequestContext, DEFAULT_API_VERSION};
#[cfg(feature = "rest")]
pub use forcelink_rest::ForceClient;
