//! Data layer for the call-log ETL.
//!
//! Owns the SQLite store, the CSV loaders that fill it, the report writers
//! that read from it and the pipeline that sequences them.

pub mod loader;
pub mod pipeline;
pub mod reports;
pub mod store;

pub use etl_core as core;
