//! Typed models for common standard objects.
//!
//! Each model declares its field policies once in a static table. Fields
//! absent from the table are editable; system fields such as `Id` and
//! `CreatedDate` are always read-only.

use std::sync::LazyLock;

use forcelink_client::{FieldPolicies, FieldPolicy, FieldPolicyTable, SObject, SfDate, SfDateTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// Account
// ============================================================================

/// Account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SfAccount {
    pub id: Option<String>,
    pub name: Option<String>,
    pub account_number: Option<String>,
    #[serde(rename = "Type")]
    pub account_type: Option<String>,
    pub industry: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub number_of_employees: Option<i32>,
    pub annual_revenue: Option<f64>,
    pub parent_id: Option<String>,
    pub is_deleted: Option<bool>,
    pub last_activity_date: Option<SfDate>,
    pub created_date: Option<SfDateTime>,
    pub created_by_id: Option<String>,
    pub last_modified_date: Option<SfDateTime>,
    pub last_modified_by_id: Option<String>,
    pub system_modstamp: Option<SfDateTime>,
}

static ACCOUNT_POLICIES: LazyLock<FieldPolicyTable> = LazyLock::new(|| {
    FieldPolicyTable::builder()
        .field("LastActivityDate", FieldPolicy::READ_ONLY)
        .build()
});

impl FieldPolicies for SfAccount {
    fn field_policies() -> &'static FieldPolicyTable {
        &ACCOUNT_POLICIES
    }
}

impl SObject for SfAccount {
    const SOBJECT_TYPE_NAME: &'static str = "Account";
}

// ============================================================================
// Contact
// ============================================================================

/// Contact
///
/// `Account` is the parent relationship. It is sent only when populated and
/// is filtered with the Account table, so an embedded account never carries
/// its `Id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SfContact {
    pub id: Option<String>,
    pub account_id: Option<String>,
    pub account: Option<SfAccount>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub birthdate: Option<SfDate>,
    pub master_record_id: Option<String>,
    pub is_deleted: Option<bool>,
    pub created_date: Option<SfDateTime>,
    pub created_by_id: Option<String>,
    pub last_modified_date: Option<SfDateTime>,
    pub last_modified_by_id: Option<String>,
    pub system_modstamp: Option<SfDateTime>,
}

static CONTACT_POLICIES: LazyLock<FieldPolicyTable> = LazyLock::new(|| {
    FieldPolicyTable::builder()
        .nested("Account", FieldPolicy::EDITABLE, SfAccount::field_policies)
        .field("Name", FieldPolicy::READ_ONLY)
        .field("MasterRecordId", FieldPolicy::READ_ONLY)
        .build()
});

impl FieldPolicies for SfContact {
    fn field_policies() -> &'static FieldPolicyTable {
        &CONTACT_POLICIES
    }
}

impl SObject for SfContact {
    const SOBJECT_TYPE_NAME: &'static str = "Contact";
}
