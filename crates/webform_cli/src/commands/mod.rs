//! Subcommand handlers.

pub mod migrate;
pub mod state;
