//! Row types for the legacy and target schemas.

mod legacy;
mod target;

pub use legacy::{ComponentRow, EmailTemplateRow, FormRow, FormSettingsRow, SubmittedValueRow};
pub use target::{StoredForm, StoredSubmission};
