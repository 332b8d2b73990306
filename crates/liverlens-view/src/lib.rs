//! liverlens-view
//!
//! The record browsing engine: compile filters, sort, paginate, track the
//! selection, and reconcile deletions. Client-side browsing goes through
//! [`pipeline::ViewState`]; server-filtered browsing goes through
//! [`remote::RemoteQueryAdapter`].

pub mod debounce;
pub mod error;
pub mod mutate;
pub mod paginate;
pub mod pipeline;
pub mod predicate;
pub mod remote;
pub mod selection;
pub mod sort;
pub mod summary;
