//! Record write results.

use forcelink_client::SalesforceError;
use serde::{Deserialize, Serialize};

/// Body of a successful create, or of an upsert that inserted a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreateResponse {
    pub id: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<SalesforceError>,
    /// Set by upserts; absent on plain creates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
}

/// Per-record outcome of a collection write.
///
/// A failed record has no id and carries its errors, which use
/// `statusCode` rather than `errorCode`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SaveResult {
    #[serde(default)]
    pub id: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<SalesforceError>,
}

impl SaveResult {
    /// The first error's message, if the record failed.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}
