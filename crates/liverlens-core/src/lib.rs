//! liverlens-core
//!
//! Pure domain types for the record browsing engine: prediction records,
//! the field registry, and the filter and sort criteria an operator edits.
//! No network dependency; everything else in LiverLens builds on these.

pub mod error;
pub mod field;
pub mod models;
