//! Webform Core
//!
//! Transformation engine that migrates legacy webform definitions and their
//! submissions into the hierarchical target schema.

pub mod assembler;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod mapper;
pub mod migrator;
pub mod models;
pub mod normalizer;
pub mod payload;
pub mod report;
pub mod settings;
pub mod source;

#[cfg(test)]
pub mod test_helpers;

pub use assembler::{assemble, AssembledForm, FormInput};
pub use config::{MigrateConfig, MigrationOptions};
pub use error::{DecodeError, MigrateError, Result};
pub use hierarchy::{build_hierarchy, FieldTree};
pub use mapper::{map_field, MappedField};
pub use migrator::{purge_submissions, Migrator, PurgeSummary, RunSummary};
pub use models::{
    target_form_id, AnnotatedField, LegacyFieldRecord, LegacyForm, RawSubmissionRow,
    SubmissionMetadata, SubmissionRecord, TargetFieldDefinition, TargetForm, TargetType,
};
pub use normalizer::normalize_submissions;
pub use report::{Reporter, RunReport};
pub use settings::{EmailHandler, LegacyEmailTemplate, LegacyFormSettings, TargetFormSettings};
pub use source::{FormStore, LegacySource, WatermarkStore};
