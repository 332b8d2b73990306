//! liverlens-session
//!
//! Wiring for the two browsing call sites: the prediction history (client-side
//! filtering with bulk delete) and the dataset explorer (server-side
//! filtering, debounced edits). Also owns the engine config file and tracing
//! setup.

pub mod config;
pub mod explorer;
pub mod history;
pub mod telemetry;
