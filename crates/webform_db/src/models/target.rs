//! Rows of the target schema.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use webform_core::{EmailHandler, TargetFieldDefinition, TargetFormSettings};

use crate::error::DbResult;

/// A migrated form as stored. Structured columns hold JSON.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StoredForm {
    /// Target form id, `webform_<nid>`
    pub id: String,
    pub legacy_id: i64,
    pub title: String,
    pub elements: String,
    pub settings: Option<String>,
    pub handlers: String,
    pub updated_at: DateTime<Utc>,
}

impl StoredForm {
    pub fn elements(&self) -> DbResult<IndexMap<String, TargetFieldDefinition>> {
        Ok(serde_json::from_str(&self.elements)?)
    }

    pub fn settings(&self) -> DbResult<Option<TargetFormSettings>> {
        self.settings
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(Into::into)
    }

    pub fn handlers(&self) -> DbResult<Vec<EmailHandler>> {
        Ok(serde_json::from_str(&self.handlers)?)
    }
}

/// A migrated submission as stored.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StoredSubmission {
    pub webform_id: String,
    pub legacy_sid: i64,
    pub uid: i64,
    pub remote_addr: String,
    /// Unix timestamp of the original submission
    pub submitted: i64,
    /// JSON object of field key to value
    pub data: String,
    pub migrated_at: DateTime<Utc>,
}

impl StoredSubmission {
    pub fn values(&self) -> DbResult<IndexMap<String, String>> {
        Ok(serde_json::from_str(&self.data)?)
    }
}
