//! # forcelink-client
//!
//! Core HTTP and JSON infrastructure for the Salesforce REST API.
//!
//! This crate provides:
//! - Resource URL construction for every REST resource and OAuth endpoint
//! - Field-policy serialization (create, update and complete modes)
//! - An authenticated JSON request pipeline with typed API errors
//! - Deadlines and cancellation threaded through every request
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (forcelink-rest ForceClient, forcelink-auth flows)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      JsonClient                             │
//! │  - Attaches the bearer token                                │
//! │  - Serializes bodies through the field-policy serializer    │
//! │  - Maps 204 / 2xx / 300 / other statuses to T or ApiError   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - Pooled reqwest transport with compression                │
//! │  - Runs each exchange under a RequestContext                │
//! │  - Transport failures become ApiError, never retried        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcelink_client::{urls, JsonClient, RequestContext, DEFAULT_API_VERSION};
//!
//! let client = JsonClient::new(access_token)?;
//! let url = urls::sobject_rows(&instance_url, DEFAULT_API_VERSION, "Account", &id, &["Name"])?;
//! let account: serde_json::Value = client.get(&url, &RequestContext::new()).await?;
//! ```

mod client;
mod config;
mod context;
pub mod datetime;
mod error;
mod json_client;
pub mod policy;
mod request;
mod response;
pub mod serializer;
pub mod urls;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use context::{cancellation, CancelHandle, CancelSignal, RequestContext};
pub use datetime::{SfDate, SfDateTime};
pub use error::{ApiError, Error, ErrorKind, Result};
pub use json_client::{interpret, JsonClient, EMPTY_CONTENT_MESSAGE, MULTIPLE_MATCHES_MESSAGE};
pub use policy::{
    FieldPolicies, FieldPolicy, FieldPolicyTable, FieldPolicyTableBuilder, FieldRule, SObject,
    SerializationMode,
};
pub use request::{RequestBody, RequestBuilder, RequestMethod};
pub use response::{ApiUsage, Response, SalesforceError};
pub use serializer::{serialize_complete, serialize_for_create, serialize_for_update, to_value};
pub use urls::DisplayType;

/// Default Salesforce API version.
pub const DEFAULT_API_VERSION: &str = "v62.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("forcelink/", env!("CARGO_PKG_VERSION"));
