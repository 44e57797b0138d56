//! Webform Database Layer
//!
//! SQLite storage for webform migrations: a read-only [`LegacyDb`] over a
//! copy of the legacy site database, and a [`TargetDb`] holding migrated
//! forms, submissions and the watermark.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use webform_core::Migrator;
//! use webform_db::{LegacyDb, TargetDb};
//!
//! let legacy = Arc::new(LegacyDb::open("legacy.db").await?);
//! let target = Arc::new(TargetDb::open("target.db").await?);
//! let migrator = Migrator::new(legacy, target.clone(), target);
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod queries;
mod source;
mod store;

#[cfg(test)]
pub mod test_helpers;

pub use connection::{LegacyDb, TargetDb, TargetStats};
pub use error::{DbError, DbResult};
pub use models::{StoredForm, StoredSubmission};
