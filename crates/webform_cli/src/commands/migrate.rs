//! `run`, `check` and `purge`.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use miette::Result;
use owo_colors::OwoColorize;
use webform_core::{purge_submissions, FormStore, LegacySource, MigrateConfig, Migrator, RunSummary};

use crate::output::Output;

/// Migrate every selected form and print the summary.
pub async fn run(
    migrator: &Migrator,
    config: &MigrateConfig,
    json: bool,
    output: &Output,
) -> Result<()> {
    let options = &config.migration;
    match options.form_identifier {
        Some(nid) => output.status(&format!("Migrating legacy form {}", nid.bright_cyan())),
        None => output.status("Migrating all legacy forms"),
    }
    if options.simulate {
        output.warning("Simulation mode: nothing will be written");
    }

    let summary = migrator.run(options).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&summary).map_err(|e| miette::miette!("{e}"))?;
        output.print(&rendered);
        return Ok(());
    }
    print_summary(&summary, output);
    Ok(())
}

fn print_summary(summary: &RunSummary, output: &Output) {
    output.section("Migration summary");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["", "Migrated", "Failed"]);
    table.add_row(vec![
        Cell::new("Forms"),
        Cell::new(summary.forms_migrated),
        Cell::new(summary.forms_failed),
    ]);
    table.add_row(vec![
        Cell::new("Submissions"),
        Cell::new(summary.submissions_migrated),
        Cell::new(summary.submissions_skipped),
    ]);
    output.print(&table.to_string());
    output.kv("Watermark", &summary.watermark.to_string());

    let notices: Vec<&str> = summary.report.notices().collect();
    if !notices.is_empty() {
        output.section("Notices");
        for notice in notices {
            output.list_item(notice);
        }
    }

    if summary.report.has_errors() {
        output.section("Errors");
        for error in summary.report.errors() {
            output.error(error);
        }
    } else {
        output.success("Migration finished without errors");
    }
}

/// Connection test against the legacy database.
pub async fn check(source: &dyn LegacySource, output: &Output) -> Result<()> {
    let nid = source.check_connection().await?;
    output.success(&format!(
        "Legacy database reachable; first webform is {}",
        nid.bright_cyan()
    ));
    Ok(())
}

pub async fn purge(
    store: &dyn FormStore,
    form_identifier: i64,
    simulate: bool,
    output: &Output,
) -> Result<()> {
    let summary = purge_submissions(store, form_identifier, simulate).await?;
    if simulate {
        output.warning(&format!(
            "Simulation mode: submissions of {} were not deleted",
            summary.form_id
        ));
    } else {
        output.success(&format!(
            "Deleted {} submission(s) of {}",
            summary.deleted, summary.form_id
        ));
    }
    Ok(())
}
