//! [`LegacySource`] backed by the legacy SQLite database.

use async_trait::async_trait;
use tracing::debug;
use webform_core::{
    LegacyEmailTemplate, LegacyFieldRecord, LegacyForm, LegacyFormSettings, LegacySource,
    MigrateError, RawSubmissionRow, Result,
};

use crate::connection::LegacyDb;
use crate::queries::legacy;

#[async_trait]
impl LegacySource for LegacyDb {
    async fn check_connection(&self) -> Result<i64> {
        legacy::first_form_id(self.pool())
            .await
            .map_err(|e| e.into_source_error("legacy webforms"))?
            .ok_or_else(|| MigrateError::not_found("legacy webforms"))
    }

    async fn list_forms(&self, form_identifier: Option<i64>) -> Result<Vec<LegacyForm>> {
        let forms = legacy::list_forms(self.pool(), form_identifier)
            .await
            .map_err(|e| e.into_source_error("legacy webforms"))?;
        debug!("Found {} legacy form(s)", forms.len());
        Ok(forms.into_iter().map(Into::into).collect())
    }

    async fn form_fields(&self, form: &LegacyForm) -> Result<Vec<LegacyFieldRecord>> {
        let components = legacy::list_components(self.pool(), form.nid)
            .await
            .map_err(|e| e.into_source_error(format!("components of form {}", form.nid)))?;
        Ok(components.into_iter().map(Into::into).collect())
    }

    async fn form_settings(&self, form: &LegacyForm) -> Result<Option<LegacyFormSettings>> {
        let settings = legacy::get_settings(self.pool(), form.nid)
            .await
            .map_err(|e| e.into_source_error(format!("settings of form {}", form.nid)))?;
        Ok(settings.map(Into::into))
    }

    async fn email_templates(&self, form: &LegacyForm) -> Result<Vec<LegacyEmailTemplate>> {
        let templates = legacy::list_email_templates(self.pool(), form.nid)
            .await
            .map_err(|e| e.into_source_error(format!("email templates of form {}", form.nid)))?;
        Ok(templates.into_iter().map(Into::into).collect())
    }

    async fn submission_ids(
        &self,
        form: &LegacyForm,
        after: i64,
        limit: Option<u64>,
    ) -> Result<Vec<i64>> {
        legacy::list_submission_ids(self.pool(), form.nid, after, limit)
            .await
            .map_err(|e| e.into_source_error(format!("submissions of form {}", form.nid)))
    }

    async fn submitted_values(&self, form: &LegacyForm, after: i64) -> Result<Vec<RawSubmissionRow>> {
        let rows = legacy::list_submitted_values(self.pool(), form.nid, after)
            .await
            .map_err(|e| e.into_source_error(format!("submitted values of form {}", form.nid)))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
