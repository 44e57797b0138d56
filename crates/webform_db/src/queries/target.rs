//! Writes and reads against the target schema.
//!
//! Every write is an upsert so a rerun replaces what an earlier run stored.

use chrono::Utc;
use sqlx::SqlitePool;
use webform_core::{SubmissionRecord, TargetForm};

use crate::error::DbResult;
use crate::models::{StoredForm, StoredSubmission};

const WATERMARK_NAME: &str = "last_submission_id";

/// Create or update a migrated form.
pub async fn upsert_form(pool: &SqlitePool, form: &TargetForm) -> DbResult<()> {
    let elements = serde_json::to_string(&form.elements)?;
    let settings = form.settings.as_ref().map(serde_json::to_string).transpose()?;
    let handlers = serde_json::to_string(&form.handlers)?;

    sqlx::query(
        r#"
        INSERT INTO webforms (id, legacy_id, title, elements, settings, handlers, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            legacy_id = excluded.legacy_id,
            title = excluded.title,
            elements = excluded.elements,
            settings = excluded.settings,
            handlers = excluded.handlers,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&form.id)
    .bind(form.legacy_id)
    .bind(&form.title)
    .bind(elements)
    .bind(settings)
    .bind(handlers)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_form(pool: &SqlitePool, id: &str) -> DbResult<Option<StoredForm>> {
    let form = sqlx::query_as::<_, StoredForm>(
        r#"
        SELECT id, legacy_id, title, elements, settings, handlers, updated_at
        FROM webforms WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(form)
}

/// Create or replace a submission, keyed by form and legacy submission id.
pub async fn upsert_submission(
    pool: &SqlitePool,
    webform_id: &str,
    submission: &SubmissionRecord,
) -> DbResult<()> {
    let data = serde_json::to_string(&submission.values)?;

    sqlx::query(
        r#"
        INSERT INTO webform_submissions
            (webform_id, legacy_sid, uid, remote_addr, submitted, data, migrated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(webform_id, legacy_sid) DO UPDATE SET
            uid = excluded.uid,
            remote_addr = excluded.remote_addr,
            submitted = excluded.submitted,
            data = excluded.data,
            migrated_at = excluded.migrated_at
        "#,
    )
    .bind(webform_id)
    .bind(submission.legacy_submission_id)
    .bind(submission.metadata.uid)
    .bind(&submission.metadata.remote_addr)
    .bind(submission.metadata.submitted)
    .bind(data)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// Submissions of a form, ascending by legacy id.
pub async fn list_submissions(pool: &SqlitePool, webform_id: &str) -> DbResult<Vec<StoredSubmission>> {
    let submissions = sqlx::query_as::<_, StoredSubmission>(
        r#"
        SELECT webform_id, legacy_sid, uid, remote_addr, submitted, data, migrated_at
        FROM webform_submissions
        WHERE webform_id = ?
        ORDER BY legacy_sid
        "#,
    )
    .bind(webform_id)
    .fetch_all(pool)
    .await?;
    Ok(submissions)
}

pub async fn delete_submissions(pool: &SqlitePool, webform_id: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM webform_submissions WHERE webform_id = ?")
        .bind(webform_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Point a legacy content record at its migrated form.
pub async fn upsert_content_link(pool: &SqlitePool, nid: i64, webform_id: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO content_links (nid, webform_id, linked_at)
        VALUES (?, ?, ?)
        ON CONFLICT(nid) DO UPDATE SET
            webform_id = excluded.webform_id,
            linked_at = excluded.linked_at
        "#,
    )
    .bind(nid)
    .bind(webform_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_content_link(pool: &SqlitePool, nid: i64) -> DbResult<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT webform_id FROM content_links WHERE nid = ?")
        .bind(nid)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(id,)| id))
}

/// Last migrated submission id, 0 when unset.
pub async fn get_watermark(pool: &SqlitePool) -> DbResult<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT value FROM migration_state WHERE name = ?")
        .bind(WATERMARK_NAME)
        .fetch_optional(pool)
        .await?;
    Ok(row.map_or(0, |(value,)| value))
}

pub async fn set_watermark(pool: &SqlitePool, value: i64) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO migration_state (name, value) VALUES (?, ?)
        ON CONFLICT(name) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(WATERMARK_NAME)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}
