//! Collaborator interfaces at the edge of the transformation core.
//!
//! The core never talks to a database itself. The driver reads legacy rows
//! through a [`LegacySource`], hands finished forms to a [`FormStore`] and
//! tracks progress in a [`WatermarkStore`]. Implementations surface
//! unreachable backends as [`MigrateError::Connectivity`](crate::MigrateError)
//! and never retry. Rows that are present but unreadable are reported as
//! `InvalidData`, which fails only the form being read.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{LegacyFieldRecord, LegacyForm, RawSubmissionRow, SubmissionRecord, TargetForm};
use crate::settings::{LegacyEmailTemplate, LegacyFormSettings};

/// Read access to the legacy schema.
#[async_trait]
pub trait LegacySource: Send + Sync {
    /// Verify the connection by fetching one form id.
    async fn check_connection(&self) -> Result<i64>;

    /// All legacy forms, or only the one named by `form_identifier`.
    async fn list_forms(&self, form_identifier: Option<i64>) -> Result<Vec<LegacyForm>>;

    /// Field records of a form ordered by weight.
    async fn form_fields(&self, form: &LegacyForm) -> Result<Vec<LegacyFieldRecord>>;

    async fn form_settings(&self, form: &LegacyForm) -> Result<Option<LegacyFormSettings>>;

    /// Email templates ordered by template id.
    async fn email_templates(&self, form: &LegacyForm) -> Result<Vec<LegacyEmailTemplate>>;

    /// Submission ids above `after`, ascending, at most `limit` of them.
    async fn submission_ids(
        &self,
        form: &LegacyForm,
        after: i64,
        limit: Option<u64>,
    ) -> Result<Vec<i64>>;

    /// Joined value rows of every submission above `after`.
    async fn submitted_values(&self, form: &LegacyForm, after: i64) -> Result<Vec<RawSubmissionRow>>;
}

/// Write access to the target schema. Every write is create-or-update so
/// reruns are idempotent.
#[async_trait]
pub trait FormStore: Send + Sync {
    async fn upsert_form(&self, form: &TargetForm) -> Result<()>;

    async fn save_submission(&self, form_id: &str, submission: &SubmissionRecord) -> Result<()>;

    /// Delete every migrated submission of a form, returning how many went.
    async fn delete_submissions(&self, form_id: &str) -> Result<u64>;

    /// Point the legacy content record at the migrated form.
    async fn link_content(&self, legacy_form_id: i64, form_id: &str) -> Result<()>;
}

/// The "last migrated submission id" watermark.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Current watermark, 0 when nothing was migrated yet.
    async fn load(&self) -> Result<i64>;

    async fn store(&self, last_submission_id: i64) -> Result<()>;
}
