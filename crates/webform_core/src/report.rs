//! Progress and error reporting.
//!
//! Components never print; they hand human readable messages to a
//! [`Reporter`]. The run keeps its messages in a [`RunReport`] value that is
//! returned to the caller, so forms processed in parallel each get their own.

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{error, info, warn};

/// Sink for progress messages, notices and errors.
pub trait Reporter {
    /// Progress information.
    fn info(&mut self, message: &str);

    /// Non-fatal notice (skipped data, collisions, ...).
    fn warn(&mut self, message: &str);

    /// Error surfaced at the end of the run.
    fn error(&mut self, message: &str);
}

/// Messages collected during a run.
///
/// Errors are deduplicated by content, keeping first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    notices: Vec<String>,
    errors: IndexSet<String>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> impl Iterator<Item = &str> {
        self.notices.iter().map(String::as_str)
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Fold another report into this one, keeping deduplication.
    pub fn merge(&mut self, other: RunReport) {
        self.notices.extend(other.notices);
        self.errors.extend(other.errors);
    }
}

impl Reporter for RunReport {
    fn info(&mut self, message: &str) {
        info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        warn!("{message}");
        self.notices.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        error!("{message}");
        self.errors.insert(message.to_string());
    }
}
