//! Reads against the legacy schema.

use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::models::{ComponentRow, EmailTemplateRow, FormRow, FormSettingsRow, SubmittedValueRow};

/// SQLite treats a negative LIMIT as "no limit".
const NO_LIMIT: i64 = -1;

/// Lowest webform nid, if any.
pub async fn first_form_id(pool: &SqlitePool) -> DbResult<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT nid FROM webform ORDER BY nid LIMIT 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(nid,)| nid))
}

/// Webforms with their content titles, optionally restricted to one nid.
pub async fn list_forms(pool: &SqlitePool, nid: Option<i64>) -> DbResult<Vec<FormRow>> {
    let forms = sqlx::query_as::<_, FormRow>(
        r#"
        SELECT w.nid AS nid, COALESCE(n.title, '') AS title
        FROM webform w
        LEFT JOIN node n ON n.nid = w.nid
        WHERE ?1 IS NULL OR w.nid = ?1
        ORDER BY w.nid
        "#,
    )
    .bind(nid)
    .fetch_all(pool)
    .await?;
    Ok(forms)
}

/// Components of a form ordered by weight, then id.
pub async fn list_components(pool: &SqlitePool, nid: i64) -> DbResult<Vec<ComponentRow>> {
    let components = sqlx::query_as::<_, ComponentRow>(
        r#"
        SELECT
            cid,
            pid,
            COALESCE(form_key, '') AS form_key,
            COALESCE(name, '') AS name,
            COALESCE(type, '') AS type,
            COALESCE(value, '') AS value,
            CAST(COALESCE(extra, '') AS BLOB) AS extra,
            mandatory,
            weight
        FROM webform_component
        WHERE nid = ?
        ORDER BY weight, cid
        "#,
    )
    .bind(nid)
    .fetch_all(pool)
    .await?;
    Ok(components)
}

pub async fn get_settings(pool: &SqlitePool, nid: i64) -> DbResult<Option<FormSettingsRow>> {
    let settings = sqlx::query_as::<_, FormSettingsRow>(
        r#"
        SELECT
            status,
            COALESCE(confirmation, '') AS confirmation,
            COALESCE(redirect_url, '') AS redirect_url
        FROM webform WHERE nid = ?
        "#,
    )
    .bind(nid)
    .fetch_optional(pool)
    .await?;
    Ok(settings)
}

/// Email templates ordered by template id.
pub async fn list_email_templates(pool: &SqlitePool, nid: i64) -> DbResult<Vec<EmailTemplateRow>> {
    let templates = sqlx::query_as::<_, EmailTemplateRow>(
        r#"
        SELECT
            eid,
            COALESCE(email, '') AS email,
            COALESCE(subject, '') AS subject,
            COALESCE(from_name, '') AS from_name,
            COALESCE(from_address, '') AS from_address,
            COALESCE(template, '') AS template
        FROM webform_emails
        WHERE nid = ?
        ORDER BY eid
        "#,
    )
    .bind(nid)
    .fetch_all(pool)
    .await?;
    Ok(templates)
}

/// Submission ids of a form above `after`, ascending.
pub async fn list_submission_ids(
    pool: &SqlitePool,
    nid: i64,
    after: i64,
    limit: Option<u64>,
) -> DbResult<Vec<i64>> {
    let limit = limit.map_or(NO_LIMIT, |n| i64::try_from(n).unwrap_or(i64::MAX));
    let rows: Vec<(i64,)> = sqlx::query_as(
        r#"
        SELECT sid FROM webform_submissions
        WHERE nid = ? AND sid > ?
        ORDER BY sid
        LIMIT ?
        "#,
    )
    .bind(nid)
    .bind(after)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(sid,)| sid).collect())
}

/// Submitted values of a form above `after`, joined with submitter
/// metadata and the component key, in submission then component order.
pub async fn list_submitted_values(
    pool: &SqlitePool,
    nid: i64,
    after: i64,
) -> DbResult<Vec<SubmittedValueRow>> {
    let rows = sqlx::query_as::<_, SubmittedValueRow>(
        r#"
        SELECT
            d.sid AS sid,
            COALESCE(c.form_key, '') AS form_key,
            COALESCE(d.data, '') AS data,
            s.uid AS uid,
            COALESCE(s.remote_addr, '') AS remote_addr,
            s.submitted AS submitted
        FROM webform_submitted_data d
        JOIN webform_submissions s ON s.sid = d.sid
        JOIN webform_component c ON c.nid = d.nid AND c.cid = d.cid
        WHERE d.nid = ? AND d.sid > ?
        ORDER BY d.sid, d.cid, d.no
        "#,
    )
    .bind(nid)
    .bind(after)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
