//! Composition of one legacy form into its target form and submissions.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::MigrationOptions;
use crate::error::{MigrateError, Result};
use crate::hierarchy::build_hierarchy;
use crate::mapper::map_field;
use crate::models::{
    target_form_id, AnnotatedField, LegacyFieldRecord, LegacyForm, RawSubmissionRow,
    SubmissionRecord, TargetForm,
};
use crate::normalizer::normalize_submissions;
use crate::report::Reporter;
use crate::settings::{map_email_handlers, map_form_settings, LegacyEmailTemplate, LegacyFormSettings};

/// Everything read from the legacy source for one form.
#[derive(Debug, Clone)]
pub struct FormInput {
    pub form: LegacyForm,
    pub fields: Vec<LegacyFieldRecord>,
    pub settings: Option<LegacyFormSettings>,
    pub email_templates: Vec<LegacyEmailTemplate>,
    /// Selected submissions, past the watermark
    pub submission_ids: Vec<i64>,
    pub submitted_values: Vec<RawSubmissionRow>,
}

impl FormInput {
    /// Input with fields only; settings, templates and submissions empty.
    pub fn new(form: LegacyForm, fields: Vec<LegacyFieldRecord>) -> Self {
        Self {
            form,
            fields,
            settings: None,
            email_templates: Vec::new(),
            submission_ids: Vec::new(),
            submitted_values: Vec::new(),
        }
    }
}

/// A fully assembled form, ready for the persistence collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledForm {
    pub form: TargetForm,
    /// Ascending by legacy submission id
    pub submissions: Vec<SubmissionRecord>,
}

/// Map, link and normalize one legacy form.
///
/// Fails with [`MigrateError::Validation`] when the form has no title and
/// with [`MigrateError::Decode`] when any field's payload cannot be decoded;
/// a form with an unreadable field is never partially migrated.
pub fn assemble<R: Reporter + ?Sized>(
    input: FormInput,
    options: &MigrationOptions,
    report: &mut R,
) -> Result<AssembledForm> {
    let FormInput {
        form,
        mut fields,
        settings,
        email_templates,
        submission_ids,
        submitted_values,
    } = input;

    let id = target_form_id(form.nid);
    if form.title.trim().is_empty() {
        return Err(MigrateError::validation(id, "title cannot be empty"));
    }

    // Stable: equal weights keep declaration order
    fields.sort_by_key(|field| field.weight);

    let component_keys: BTreeMap<i64, String> = fields
        .iter()
        .map(|field| (field.legacy_id, field.key.clone()))
        .collect();

    let mut annotated = Vec::with_capacity(fields.len());
    for field in &fields {
        let mapped = map_field(field).map_err(|cause| MigrateError::Decode {
            form_id: form.nid,
            cid: field.legacy_id,
            form_key: field.key.clone(),
            cause,
        })?;
        for key in &mapped.collisions {
            report.warn(&format!(
                "Grid field '{}' has several questions with the sub-element key '{key}'; only the last one is kept",
                field.key
            ));
        }
        annotated.push(AnnotatedField {
            legacy_id: field.legacy_id,
            parent_legacy_id: field.parent_legacy_id,
            definition: mapped.definition,
        });
    }

    let tree = build_hierarchy(annotated);
    for key in &tree.collisions {
        report.warn(&format!(
            "Form {}: several fields share the key '{key}'; only the last one is kept",
            form.nid
        ));
    }
    debug!("Form {}: {} root elements", form.nid, tree.elements.len());

    let submissions = select_submissions(&form, &fields, submission_ids, submitted_values, options, report);

    Ok(AssembledForm {
        form: TargetForm {
            id,
            legacy_id: form.nid,
            title: form.title,
            elements: tree.elements,
            settings: settings.as_ref().map(map_form_settings),
            handlers: map_email_handlers(&email_templates, &component_keys),
        },
        submissions,
    })
}

fn select_submissions<R: Reporter + ?Sized>(
    form: &LegacyForm,
    fields: &[LegacyFieldRecord],
    mut submission_ids: Vec<i64>,
    submitted_values: Vec<RawSubmissionRow>,
    options: &MigrationOptions,
    report: &mut R,
) -> Vec<SubmissionRecord> {
    submission_ids.sort_unstable();
    submission_ids.dedup();
    if let Some(max) = options.max_submissions {
        submission_ids.truncate(usize::try_from(max).unwrap_or(usize::MAX));
    }

    if fields.is_empty() {
        for sid in submission_ids {
            report.warn(&MigrateError::MissingData { form_id: form.nid, sid }.to_string());
        }
        return Vec::new();
    }

    normalize_submissions(&submission_ids, submitted_values, report)
}
