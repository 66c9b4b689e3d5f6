//! Per-field create/update policies.
//!
//! Each model type declares a [`FieldPolicyTable`] once, usually behind a
//! `LazyLock`, and exposes it through [`FieldPolicies`]. The serializer
//! consults the table for every field it visits.
//!
//! ```rust
//! use std::sync::LazyLock;
//! use forcelink_client::{FieldPolicies, FieldPolicy, FieldPolicyTable};
//!
//! struct Case;
//!
//! static CASE_POLICIES: LazyLock<FieldPolicyTable> = LazyLock::new(|| {
//!     FieldPolicyTable::builder()
//!         .field("CaseNumber", FieldPolicy::READ_ONLY)
//!         .field("Origin", FieldPolicy::CREATE_ONLY)
//!         .build()
//! });
//!
//! impl FieldPolicies for Case {
//!     fn field_policies() -> &'static FieldPolicyTable {
//!         &CASE_POLICIES
//!     }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use serde::Serialize;

/// Fields Salesforce manages itself. They are read-only in every table.
pub const SYSTEM_FIELDS: &[&str] = &[
    "id",
    "createddate",
    "createdbyid",
    "lastmodifieddate",
    "lastmodifiedbyid",
    "systemmodstamp",
    "isdeleted",
    "lastvieweddate",
    "lastreferenceddate",
];

/// Whether a field may be sent when creating and when updating a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub creatable: bool,
    pub updateable: bool,
}

impl FieldPolicy {
    pub const EDITABLE: FieldPolicy = FieldPolicy {
        creatable: true,
        updateable: true,
    };
    pub const READ_ONLY: FieldPolicy = FieldPolicy {
        creatable: false,
        updateable: false,
    };
    pub const CREATE_ONLY: FieldPolicy = FieldPolicy {
        creatable: true,
        updateable: false,
    };
    pub const UPDATE_ONLY: FieldPolicy = FieldPolicy {
        creatable: false,
        updateable: true,
    };
}

impl Default for FieldPolicy {
    fn default() -> Self {
        FieldPolicy::EDITABLE
    }
}

/// Which policy flag decides whether a field is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SerializationMode {
    /// Only creatable fields.
    Create,
    /// Only updateable fields.
    Update,
    /// Every field.
    #[default]
    Complete,
}

impl SerializationMode {
    pub fn includes(&self, policy: FieldPolicy) -> bool {
        match self {
            SerializationMode::Create => policy.creatable,
            SerializationMode::Update => policy.updateable,
            SerializationMode::Complete => true,
        }
    }
}

/// Policy of a single field plus the table its nested object uses.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub policy: FieldPolicy,
    nested: Option<fn() -> &'static FieldPolicyTable>,
}

impl FieldRule {
    const PERMISSIVE: FieldRule = FieldRule {
        policy: FieldPolicy::EDITABLE,
        nested: None,
    };

    const SYSTEM: FieldRule = FieldRule {
        policy: FieldPolicy::READ_ONLY,
        nested: None,
    };

    /// The table applied to the field's value when it is an object.
    pub fn nested_table(&self) -> &'static FieldPolicyTable {
        match self.nested {
            Some(table) => table(),
            None => FieldPolicyTable::permissive(),
        }
    }
}

/// Field name to policy map for one type. Lookups ignore case.
///
/// Fields without an entry are editable, except the [`SYSTEM_FIELDS`], which
/// are always read-only.
#[derive(Debug, Clone, Default)]
pub struct FieldPolicyTable {
    fields: HashMap<String, FieldRule>,
}

static PERMISSIVE: LazyLock<FieldPolicyTable> = LazyLock::new(FieldPolicyTable::default);

impl FieldPolicyTable {
    pub fn builder() -> FieldPolicyTableBuilder {
        FieldPolicyTableBuilder::default()
    }

    /// The table for dynamic JSON: every field editable except system fields.
    pub fn permissive() -> &'static FieldPolicyTable {
        &PERMISSIVE
    }

    pub fn is_system_field(name: &str) -> bool {
        SYSTEM_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(name))
    }

    pub fn rule(&self, name: &str) -> FieldRule {
        if Self::is_system_field(name) {
            return FieldRule::SYSTEM;
        }
        self.fields
            .get(&name.to_ascii_lowercase())
            .copied()
            .unwrap_or(FieldRule::PERMISSIVE)
    }

    pub fn policy(&self, name: &str) -> FieldPolicy {
        self.rule(name).policy
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct FieldPolicyTableBuilder {
    fields: HashMap<String, FieldRule>,
}

impl FieldPolicyTableBuilder {
    pub fn field(mut self, name: &str, policy: FieldPolicy) -> Self {
        self.fields.insert(
            name.to_ascii_lowercase(),
            FieldRule {
                policy,
                nested: None,
            },
        );
        self
    }

    /// Declare a field holding another model. Its value is filtered with
    /// `table` instead of the permissive table.
    pub fn nested(
        mut self,
        name: &str,
        policy: FieldPolicy,
        table: fn() -> &'static FieldPolicyTable,
    ) -> Self {
        self.fields.insert(
            name.to_ascii_lowercase(),
            FieldRule {
                policy,
                nested: Some(table),
            },
        );
        self
    }

    pub fn build(self) -> FieldPolicyTable {
        FieldPolicyTable {
            fields: self.fields,
        }
    }
}

/// Types that carry a field policy table.
///
/// The default is the permissive table.
pub trait FieldPolicies {
    fn field_policies() -> &'static FieldPolicyTable {
        FieldPolicyTable::permissive()
    }
}

/// A Salesforce object type with its API name.
pub trait SObject: FieldPolicies + Serialize {
    const SOBJECT_TYPE_NAME: &'static str;
}

impl FieldPolicies for serde_json::Value {}
impl FieldPolicies for serde_json::Map<String, serde_json::Value> {}
impl<K, V, S> FieldPolicies for HashMap<K, V, S> {}
impl<K, V> FieldPolicies for BTreeMap<K, V> {}

impl<T: FieldPolicies> FieldPolicies for Vec<T> {
    fn field_policies() -> &'static FieldPolicyTable {
        T::field_policies()
    }
}

impl<T: FieldPolicies> FieldPolicies for [T] {
    fn field_policies() -> &'static FieldPolicyTable {
        T::field_policies()
    }
}

impl<T: FieldPolicies + ?Sized> FieldPolicies for &T {
    fn field_policies() -> &'static FieldPolicyTable {
        T::field_policies()
    }
}

impl<T: FieldPolicies> FieldPolicies for Option<T> {
    fn field_policies() -> &'static FieldPolicyTable {
        T::field_policies()
    }
}
