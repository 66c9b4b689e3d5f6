//! Describe operations and types.
//!
//! This module contains types for the Salesforce describe API,
//! which provides metadata about SObjects and their fields, and derives
//! runtime field-policy tables from that metadata.

use forcelink_client::{FieldPolicy, FieldPolicyTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Versions
// ============================================================================

/// One entry of the `/services/data` version list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiVersion {
    pub version: String,
    pub label: String,
    pub url: String,
}

// ============================================================================
// Describe Global Types
// ============================================================================

/// Result of the describeGlobal operation.
///
/// Contains a list of all SObjects accessible to the user.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DescribeGlobalResult {
    /// Character encoding (e.g., "UTF-8").
    #[serde(default)]
    pub encoding: String,

    /// Maximum batch size for composite operations.
    #[serde(rename = "maxBatchSize", default)]
    pub max_batch_size: u32,

    /// List of SObject descriptions.
    #[serde(default)]
    pub sobjects: Vec<SObjectBasicInfo>,
}

/// Basic information about an SObject from describeGlobal.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SObjectBasicInfo {
    pub name: String,
    pub label: String,
    #[serde(rename = "labelPlural", default)]
    pub label_plural: String,
    #[serde(rename = "keyPrefix")]
    pub key_prefix: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub deletable: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub retrieveable: bool,
    #[serde(default)]
    pub urls: HashMap<String, String>,
}

/// Result of `sobjects/<name>`: the object summary plus recently viewed
/// records.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SObjectBasicInformation {
    #[serde(rename = "objectDescribe")]
    pub object_describe: SObjectBasicInfo,
    #[serde(rename = "recentItems", default)]
    pub recent_items: Vec<serde_json::Value>,
}

// ============================================================================
// Describe SObject Types
// ============================================================================

/// SObject describe result.
///
/// Contains the object's capabilities, fields, relationships and record
/// types.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DescribeSObjectResult {
    // === Identity ===
    pub name: String,
    pub label: String,
    #[serde(rename = "labelPlural")]
    pub label_plural: Option<String>,
    #[serde(rename = "keyPrefix")]
    pub key_prefix: Option<String>,
    #[serde(default)]
    pub custom: bool,

    // === Capabilities (CRUD) ===
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub deletable: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub retrieveable: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub updateable: bool,
    pub undeletable: Option<bool>,
    pub mergeable: Option<bool>,

    // === Relationships ===
    #[serde(rename = "childRelationships", default)]
    pub child_relationships: Vec<ChildRelationship>,
    #[serde(default)]
    pub fields: Vec<FieldDescribe>,

    // === Record Types ===
    #[serde(rename = "recordTypeInfos", default)]
    pub record_type_infos: Vec<RecordTypeInfo>,

    #[serde(default)]
    pub urls: HashMap<String, String>,
}

impl DescribeSObjectResult {
    /// Look up a field by API name, ignoring case.
    pub fn field(&self, name: &str) -> Option<&FieldDescribe> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Field policies derived from the `createable` and `updateable` flags.
    pub fn field_policies(&self) -> FieldPolicyTable {
        FieldPolicyTable::from_describe(self)
    }
}

/// Child relationship metadata for an SObject.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChildRelationship {
    #[serde(rename = "childSObject")]
    pub child_sobject: String,
    pub field: String,
    #[serde(rename = "relationshipName")]
    pub relationship_name: Option<String>,
    #[serde(rename = "cascadeDelete")]
    pub cascade_delete: Option<bool>,
}

/// Record type information for an SObject.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecordTypeInfo {
    pub name: String,
    #[serde(rename = "recordTypeId")]
    pub record_type_id: String,
    #[serde(rename = "developerName")]
    pub developer_name: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub available: bool,
    #[serde(rename = "defaultRecordTypeMapping", default)]
    pub default_record_type_mapping: bool,
    pub master: Option<bool>,
}

// ============================================================================
// Field Describe Types
// ============================================================================

/// Field describe result.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FieldDescribe {
    // === Identity ===
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(rename = "soapType")]
    pub soap_type: Option<String>,
    pub custom: Option<bool>,
    pub length: Option<i32>,

    // === Capabilities ===
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub nillable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub unique: bool,

    // === Field Characteristics ===
    #[serde(rename = "externalId", default)]
    pub external_id: bool,
    #[serde(rename = "idLookup", default)]
    pub id_lookup: bool,
    #[serde(default)]
    pub calculated: bool,
    #[serde(rename = "autoNumber", default)]
    pub auto_number: bool,
    #[serde(rename = "defaultedOnCreate")]
    pub defaulted_on_create: Option<bool>,

    // === Relationships ===
    #[serde(rename = "referenceTo", default)]
    pub reference_to: Option<Vec<String>>,
    #[serde(rename = "relationshipName")]
    pub relationship_name: Option<String>,

    // === Picklist ===
    #[serde(rename = "picklistValues", default)]
    pub picklist_values: Option<Vec<PicklistValue>>,
}

impl FieldDescribe {
    pub fn policy(&self) -> FieldPolicy {
        FieldPolicy {
            creatable: self.createable,
            updateable: self.updateable,
        }
    }
}

/// Picklist value for picklist fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PicklistValue {
    pub value: String,
    pub label: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "defaultValue", default)]
    pub default_value: bool,
}

// ============================================================================
// Runtime policy tables
// ============================================================================

/// Build a [`FieldPolicyTable`] from describe metadata.
///
/// Lets dynamic records (maps, `serde_json::Value`) be filtered with the
/// org's real create/update rules through
/// [`to_value_with_table`](forcelink_client::serializer::to_value_with_table).
pub trait DescribePolicies {
    fn from_describe(describe: &DescribeSObjectResult) -> Self;
}

impl DescribePolicies for FieldPolicyTable {
    fn from_describe(describe: &DescribeSObjectResult) -> Self {
        describe
            .fields
            .iter()
            .fold(FieldPolicyTable::builder(), |builder, field| {
                builder.field(&field.name, field.policy())
            })
            .build()
    }
}
