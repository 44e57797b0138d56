//! Query functions, one module per schema.

pub mod legacy;
pub mod target;
