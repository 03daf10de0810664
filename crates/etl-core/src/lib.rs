//! Shared types for the call-log ETL pipeline.
//!
//! Holds the error taxonomy, the record models persisted in the store, the
//! row-validation helper used by both loaders and the CLI settings.

pub mod error;
pub mod models;
pub mod settings;
pub mod validation;
