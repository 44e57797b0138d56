//! The migration driver.
//!
//! Reads each legacy form through the [`LegacySource`], assembles it and hands
//! the result to the [`FormStore`]. Only connectivity failures stop a run;
//! any other failure is reported and the driver moves on to the next form.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::assembler::{assemble, AssembledForm, FormInput};
use crate::config::MigrationOptions;
use crate::error::{MigrateError, Result};
use crate::models::{target_form_id, LegacyForm};
use crate::report::{Reporter, RunReport};
use crate::source::{FormStore, LegacySource, WatermarkStore};

/// Outcome of a [`Migrator::run`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub forms_migrated: usize,
    pub forms_failed: usize,
    pub submissions_migrated: usize,
    pub submissions_skipped: usize,
    /// Watermark after the run
    pub watermark: i64,
    pub report: RunReport,
}

/// Outcome of a [`Migrator::purge`].
#[derive(Debug, Clone, Serialize)]
pub struct PurgeSummary {
    pub form_id: String,
    pub deleted: u64,
    pub report: RunReport,
}

/// Per form counters, folded into the run summary.
#[derive(Debug, Default)]
struct FormOutcome {
    migrated: usize,
    skipped: usize,
    highest_sid: Option<i64>,
    /// The batch hit `max_submissions`; later submissions may remain
    capped: bool,
}

pub struct Migrator {
    source: Arc<dyn LegacySource>,
    store: Arc<dyn FormStore>,
    watermark: Arc<dyn WatermarkStore>,
}

impl Migrator {
    pub fn new(
        source: Arc<dyn LegacySource>,
        store: Arc<dyn FormStore>,
        watermark: Arc<dyn WatermarkStore>,
    ) -> Self {
        Self {
            source,
            store,
            watermark,
        }
    }

    pub async fn watermark(&self) -> Result<i64> {
        self.watermark.load().await
    }

    pub async fn reset_watermark(&self) -> Result<()> {
        self.watermark.store(0).await
    }

    /// Migrate every selected form.
    pub async fn run(&self, options: &MigrationOptions) -> Result<RunSummary> {
        self.source.check_connection().await?;
        let watermark = self.watermark.load().await?;

        let forms = self.source.list_forms(options.form_identifier).await?;
        if forms.is_empty() {
            return Err(MigrateError::not_found(match options.form_identifier {
                Some(nid) => format!("legacy webform {nid}"),
                None => "legacy webforms".to_string(),
            }));
        }

        let mut summary = RunSummary {
            watermark,
            ..Default::default()
        };
        let mut report = RunReport::new();
        report.info(&format!(
            "Migrating {} form(s) past submission {watermark}{}",
            forms.len(),
            if options.simulate { " (simulated)" } else { "" }
        ));

        let mut highest_sid = watermark;
        // Lowest last sid among capped forms; the watermark must not pass it
        let mut capped_ceiling: Option<i64> = None;
        for form in &forms {
            match self.migrate_form(form, watermark, options, &mut report).await {
                Ok(outcome) => {
                    summary.forms_migrated += 1;
                    summary.submissions_migrated += outcome.migrated;
                    summary.submissions_skipped += outcome.skipped;
                    if let Some(sid) = outcome.highest_sid {
                        highest_sid = highest_sid.max(sid);
                        if outcome.capped {
                            capped_ceiling =
                                Some(capped_ceiling.map_or(sid, |ceiling| ceiling.min(sid)));
                        }
                    }
                }
                Err(e) if e.is_connectivity() => return Err(e),
                Err(e) => {
                    summary.forms_failed += 1;
                    report.error(&e.to_string());
                }
            }
        }

        if let Some(ceiling) = capped_ceiling {
            highest_sid = highest_sid.min(ceiling);
        }
        if !options.simulate && highest_sid > watermark {
            self.watermark.store(highest_sid).await?;
            summary.watermark = highest_sid;
            info!("Watermark moved from {watermark} to {highest_sid}");
        }

        summary.report = report;
        Ok(summary)
    }

    async fn migrate_form(
        &self,
        form: &LegacyForm,
        watermark: i64,
        options: &MigrationOptions,
        report: &mut RunReport,
    ) -> Result<FormOutcome> {
        let input = self.read_form(form, watermark, options).await?;
        let capped = options
            .max_submissions
            .is_some_and(|max| input.submission_ids.len() as u64 >= max);
        let assembled = assemble(input, options, report)?;

        if options.simulate {
            self.report_simulated(&assembled, report);
            return Ok(FormOutcome {
                migrated: assembled.submissions.len(),
                ..Default::default()
            });
        }

        self.store.upsert_form(&assembled.form).await?;
        report.info(&format!(
            "Form {} migrated as {}",
            assembled.form.legacy_id, assembled.form.id
        ));

        let mut outcome = FormOutcome {
            capped,
            ..Default::default()
        };
        for submission in &assembled.submissions {
            let sid = submission.legacy_submission_id;
            outcome.highest_sid = Some(outcome.highest_sid.map_or(sid, |highest| highest.max(sid)));
            match self.store.save_submission(&assembled.form.id, submission).await {
                Ok(()) => outcome.migrated += 1,
                Err(e) if e.is_connectivity() => return Err(e),
                Err(e) => {
                    outcome.skipped += 1;
                    report.error(&e.to_string());
                    report.info(&format!("Submission {sid} was not migrated"));
                }
            }
        }

        match self.store.link_content(form.nid, &assembled.form.id).await {
            Ok(()) => {}
            Err(e) if e.is_connectivity() => return Err(e),
            Err(e) => report.warn(&format!(
                "Form {} was migrated but its content record could not be linked: {e}",
                form.nid
            )),
        }

        Ok(outcome)
    }

    async fn read_form(
        &self,
        form: &LegacyForm,
        watermark: i64,
        options: &MigrationOptions,
    ) -> Result<FormInput> {
        let mut input = FormInput::new(form.clone(), self.source.form_fields(form).await?);
        input.settings = self.source.form_settings(form).await?;
        input.email_templates = self.source.email_templates(form).await?;

        if options.loads_submissions() {
            input.submission_ids = self
                .source
                .submission_ids(form, watermark, options.max_submissions)
                .await?;
            if !input.submission_ids.is_empty() {
                input.submitted_values = self.source.submitted_values(form, watermark).await?;
            }
        }
        debug!(
            "Form {}: {} fields, {} submissions",
            form.nid,
            input.fields.len(),
            input.submission_ids.len()
        );
        Ok(input)
    }

    fn report_simulated(&self, assembled: &AssembledForm, report: &mut RunReport) {
        match serde_json::to_string_pretty(&assembled.form) {
            Ok(json) => report.info(&json),
            Err(e) => report.warn(&format!(
                "Could not render form {} for display: {e}",
                assembled.form.id
            )),
        }
        report.info(&format!(
            "Form {}: {} submission(s) would be migrated",
            assembled.form.id,
            assembled.submissions.len()
        ));
    }

    /// Delete every migrated submission of one form.
    pub async fn purge(&self, form_identifier: i64, simulate: bool) -> Result<PurgeSummary> {
        purge_submissions(self.store.as_ref(), form_identifier, simulate).await
    }
}

/// Delete every migrated submission of one legacy form from the store.
///
/// Used to clear a form before reimporting it. In simulate mode nothing is
/// deleted and the summary reports zero.
pub async fn purge_submissions(
    store: &dyn FormStore,
    form_identifier: i64,
    simulate: bool,
) -> Result<PurgeSummary> {
    let form_id = target_form_id(form_identifier);
    let mut report = RunReport::new();
    if simulate {
        report.info(&format!("Submissions of {form_id} would be deleted"));
        return Ok(PurgeSummary {
            form_id,
            deleted: 0,
            report,
        });
    }

    let deleted = store.delete_submissions(&form_id).await?;
    report.info(&format!("Deleted {deleted} submission(s) of {form_id}"));
    Ok(PurgeSummary {
        form_id,
        deleted,
        report,
    })
}
