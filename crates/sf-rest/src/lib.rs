//! # forcelink-rest
//!
//! Salesforce REST API facade: login, record CRUD, query, search, describe
//! and composite requests over one authenticated session.
//!
//! ## Features
//!
//! - **Login** - Username-password login and refresh through `forcelink-auth`
//! - **SObject CRUD** - Create, read, update, upsert by external id, delete
//! - **SObject Collections** - Create up to 200 records in one request
//! - **SOQL Query** - Execute queries with automatic pagination
//! - **SOSL Search** - Full-text search across objects
//! - **Describe** - Object and field metadata, and policy tables derived from it
//! - **Composite Batch** - Up to 25 independent subrequests in one call
//! - **Limits** - Check API usage and limits
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcelink_rest::{models::SfContact, ForceClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), forcelink_rest::Error> {
//!     let client = ForceClient::login_password(
//!         "client_id",
//!         "client_secret",
//!         "user@example.com",
//!         "passwordSECURITYTOKEN",
//!         forcelink_auth::TOKEN_REQUEST_ENDPOINT,
//!     )
//!     .await?;
//!
//!     // Query
//!     let contacts: Vec<SfContact> = client
//!         .query("SELECT Id, LastName FROM Contact LIMIT 10", false)
//!         .await?;
//!
//!     // Create
//!     let contact = SfContact { last_name: Some("Smith".into()), ..Default::default() };
//!     let created = client.create_record("Contact", &contact).await?;
//!
//!     // Delete
//!     client.delete_record("Contact", &created.id).await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
pub mod composite;
pub mod describe;
mod error;
pub mod models;
pub mod query;
pub mod sobject;

// Main client
pub use client::ForceClient;

// Composite API
pub use composite::{
    BatchRequest, BatchResponse, BatchSubrequest, BatchSubresponse, CollectionRequest,
    CollectionResponse,
};

// Describe types
pub use describe::{
    ApiVersion, ChildRelationship, DescribeGlobalResult, DescribePolicies, DescribeSObjectResult,
    FieldDescribe, PicklistValue, RecordTypeInfo, SObjectBasicInfo, SObjectBasicInformation,
};

// Error types
pub use error::{Error, ErrorKind, Result};

// Query types
pub use query::{QueryResult, SearchResult};

// Record results
pub use sobject::{CreateResponse, SaveResult};
