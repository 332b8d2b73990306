//! liverlens-store
//!
//! Record Store Service client. Thin wrapper around `reqwest` that speaks the
//! `/history` and `/api/explore` endpoints with session-cookie credentials,
//! plus the store traits the view engine is written against.

pub mod backend;
pub mod client;
pub mod error;
pub mod explore;
pub mod history;
