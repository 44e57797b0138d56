//! Rows read from the legacy schema.
//!
//! Nullable legacy columns are coalesced in the queries, so every field here
//! is populated.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use webform_core::{
    LegacyEmailTemplate, LegacyFieldRecord, LegacyForm, LegacyFormSettings, RawSubmissionRow,
};

/// A webform-enabled content record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FormRow {
    pub nid: i64,
    pub title: String,
}

impl From<FormRow> for LegacyForm {
    fn from(row: FormRow) -> Self {
        Self {
            nid: row.nid,
            title: row.title,
        }
    }
}

/// One row of `webform_component`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ComponentRow {
    pub cid: i64,
    pub pid: i64,
    pub form_key: String,
    pub name: String,
    #[sqlx(rename = "type")]
    pub component_type: String,
    pub value: String,
    /// Serialized options, read as raw bytes
    pub extra: Vec<u8>,
    pub mandatory: i64,
    pub weight: i64,
}

impl From<ComponentRow> for LegacyFieldRecord {
    fn from(row: ComponentRow) -> Self {
        Self {
            legacy_id: row.cid,
            parent_legacy_id: row.pid,
            key: row.form_key,
            display_name: row.name,
            field_type: row.component_type,
            is_required: row.mandatory != 0,
            default_value: row.value,
            weight: row.weight,
            extra_payload: row.extra,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FormSettingsRow {
    pub status: i64,
    pub confirmation: String,
    pub redirect_url: String,
}

impl From<FormSettingsRow> for LegacyFormSettings {
    fn from(row: FormSettingsRow) -> Self {
        Self {
            status: row.status,
            confirmation: row.confirmation,
            redirect_url: row.redirect_url,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EmailTemplateRow {
    pub eid: i64,
    pub email: String,
    pub subject: String,
    pub from_name: String,
    pub from_address: String,
    pub template: String,
}

impl From<EmailTemplateRow> for LegacyEmailTemplate {
    fn from(row: EmailTemplateRow) -> Self {
        Self {
            eid: row.eid,
            email: row.email,
            subject: row.subject,
            from_name: row.from_name,
            from_address: row.from_address,
            template: row.template,
        }
    }
}

/// A submitted value joined with its submission and component.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SubmittedValueRow {
    pub sid: i64,
    pub form_key: String,
    pub data: String,
    pub uid: i64,
    pub remote_addr: String,
    pub submitted: i64,
}

impl From<SubmittedValueRow> for RawSubmissionRow {
    fn from(row: SubmittedValueRow) -> Self {
        Self {
            sid: row.sid,
            form_key: row.form_key,
            data: row.data,
            uid: row.uid,
            remote_addr: row.remote_addr,
            submitted: row.submitted,
        }
    }
}
