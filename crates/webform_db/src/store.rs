//! [`FormStore`] and [`WatermarkStore`] backed by the target database.

use async_trait::async_trait;
use webform_core::{FormStore, Result, SubmissionRecord, TargetForm, WatermarkStore};

use crate::connection::TargetDb;
use crate::queries::target;

#[async_trait]
impl FormStore for TargetDb {
    async fn upsert_form(&self, form: &TargetForm) -> Result<()> {
        target::upsert_form(self.pool(), form)
            .await
            .map_err(|e| e.into_store_error("form", form.id.clone()))
    }

    async fn save_submission(&self, form_id: &str, submission: &SubmissionRecord) -> Result<()> {
        target::upsert_submission(self.pool(), form_id, submission)
            .await
            .map_err(|e| {
                e.into_store_error("submission", submission.legacy_submission_id.to_string())
            })
    }

    async fn delete_submissions(&self, form_id: &str) -> Result<u64> {
        target::delete_submissions(self.pool(), form_id)
            .await
            .map_err(|e| e.into_store_error("submissions", form_id))
    }

    async fn link_content(&self, legacy_form_id: i64, form_id: &str) -> Result<()> {
        target::upsert_content_link(self.pool(), legacy_form_id, form_id)
            .await
            .map_err(|e| e.into_store_error("content link", legacy_form_id.to_string()))
    }
}

#[async_trait]
impl WatermarkStore for TargetDb {
    async fn load(&self) -> Result<i64> {
        target::get_watermark(self.pool())
            .await
            .map_err(|e| e.into_store_error("watermark", "last_submission_id"))
    }

    async fn store(&self, last_submission_id: i64) -> Result<()> {
        target::set_watermark(self.pool(), last_submission_id)
            .await
            .map_err(|e| e.into_store_error("watermark", last_submission_id.to_string()))
    }
}
