//! Composite API types.

use serde::{Deserialize, Serialize};

use crate::sobject::SaveResult;

/// A composite batch request containing multiple independent subrequests.
///
/// Batch subrequests are executed independently and cannot reference each
/// other's results. At most 25 subrequests are accepted per batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(rename = "batchRequests")]
    pub batch_requests: Vec<BatchSubrequest>,
    #[serde(rename = "haltOnError")]
    pub halt_on_error: bool,
}

impl BatchRequest {
    /// Maximum number of subrequests in a single batch.
    pub const MAX_SUBREQUESTS: usize = 25;

    pub fn new(halt_on_error: bool) -> Self {
        Self {
            batch_requests: Vec::new(),
            halt_on_error,
        }
    }

    /// Append a subrequest.
    pub fn push(mut self, subrequest: BatchSubrequest) -> Self {
        self.batch_requests.push(subrequest);
        self
    }
}

/// A single subrequest within a composite batch request.
///
/// `url` is relative to `/services/data`, e.g. `v62.0/limits`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSubrequest {
    pub method: String,
    pub url: String,
    #[serde(rename = "richInput", skip_serializing_if = "Option::is_none")]
    pub rich_input: Option<serde_json::Value>,
}

impl BatchSubrequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            rich_input: None,
        }
    }

    pub fn patch(url: impl Into<String>, rich_input: serde_json::Value) -> Self {
        Self {
            method: "PATCH".to_string(),
            url: url.into(),
            rich_input: Some(rich_input),
        }
    }

    pub fn post(url: impl Into<String>, rich_input: serde_json::Value) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            rich_input: Some(rich_input),
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: "DELETE".to_string(),
            url: url.into(),
            rich_input: None,
        }
    }
}

/// Response from a composite batch request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BatchResponse {
    #[serde(rename = "hasErrors", default)]
    pub has_errors: bool,
    #[serde(default)]
    pub results: Vec<BatchSubresponse>,
}

/// Response from a single batch subrequest.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BatchSubresponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default)]
    pub result: serde_json::Value,
}

impl BatchSubresponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Body of a `composite/sobjects` create.
///
/// Each record must carry `attributes.type`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionRequest {
    #[serde(rename = "allOrNone")]
    pub all_or_none: bool,
    pub records: Vec<serde_json::Value>,
}

/// Body of a `composite/sobjects` response.
pub type CollectionResponse = Vec<SaveResult>;
