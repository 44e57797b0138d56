//! Legacy rows and the target structures they are migrated into.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::settings::{EmailHandler, TargetFormSettings};

/// A legacy form: the content record that owned the webform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyForm {
    /// Legacy content id (nid)
    pub nid: i64,
    pub title: String,
}

/// One row of the legacy component table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyFieldRecord {
    /// Component id (cid), unique within a form
    pub legacy_id: i64,
    /// Enclosing component id (pid), 0 when top level
    pub parent_legacy_id: i64,
    /// Machine name (form_key)
    pub key: String,
    pub display_name: String,
    /// Legacy component type, e.g. `select` or `grid`
    pub field_type: String,
    pub is_required: bool,
    /// May embed token placeholders
    pub default_value: String,
    pub weight: i64,
    /// Serialized `extra` column, decoded by [`crate::payload::decode_extra`]
    #[serde(default)]
    pub extra_payload: Vec<u8>,
}

/// Element type in the target schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetType {
    Radios,
    Checkboxes,
    Select,
    ManagedFile,
    Time,
    Markup,
    WizardPage,
    CustomComposite,
    /// Any legacy type without a mapping rule is carried over by name.
    Other(String),
}

impl TargetType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Radios => "radios",
            Self::Checkboxes => "checkboxes",
            Self::Select => "select",
            Self::ManagedFile => "managed_file",
            Self::Time => "time",
            Self::Markup => "markup",
            Self::WizardPage => "wizard_page",
            Self::CustomComposite => "custom_composite",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for TargetType {
    fn from(name: &str) -> Self {
        match name {
            "radios" => Self::Radios,
            "checkboxes" => Self::Checkboxes,
            "select" => Self::Select,
            "managed_file" => Self::ManagedFile,
            "time" => Self::Time,
            "markup" => Self::Markup,
            "wizard_page" => Self::WizardPage,
            "custom_composite" => Self::CustomComposite,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for TargetType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<TargetType> for String {
    fn from(target: TargetType) -> Self {
        target.as_str().to_string()
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A migrated field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetFieldDefinition {
    pub key: String,
    pub label: String,
    pub target_type: TargetType,
    pub required: bool,
    /// `None` for element types that carry no default (markup).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Type specific properties (time format, wizard flags, grid sub-elements, ...)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    /// Nested fields keyed by their own key, in ascending legacy id order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, TargetFieldDefinition>,
}

impl TargetFieldDefinition {
    /// Look up a type specific property.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// A mapped definition still carrying the legacy ids needed for linking.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedField {
    pub legacy_id: i64,
    pub parent_legacy_id: i64,
    pub definition: TargetFieldDefinition,
}

/// One joined row of legacy submitted data.
///
/// Submitter metadata is repeated on every row of the same submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubmissionRow {
    pub sid: i64,
    pub form_key: String,
    pub data: String,
    pub uid: i64,
    pub remote_addr: String,
    /// Unix timestamp
    pub submitted: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    pub uid: i64,
    pub remote_addr: String,
    /// Unix timestamp
    pub submitted: i64,
}

impl SubmissionMetadata {
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.submitted, 0)
    }
}

/// One legacy submission, reshaped to be keyed by field key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub legacy_submission_id: i64,
    pub values: BTreeMap<String, String>,
    pub metadata: SubmissionMetadata,
}

/// The migrated form handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetForm {
    /// Target form identifier, `webform_<nid>`
    pub id: String,
    pub legacy_id: i64,
    pub title: String,
    pub elements: IndexMap<String, TargetFieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<TargetFormSettings>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handlers: Vec<EmailHandler>,
}

/// Target identifier for a legacy form.
pub fn target_form_id(nid: i64) -> String {
    format!("webform_{nid}")
}
