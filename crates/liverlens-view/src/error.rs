use liverlens_store::error::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("a delete is already in progress")]
    MutationInFlight,

    #[error("no records selected")]
    EmptySelection,

    #[error(transparent)]
    Store(StoreError),
}

impl ViewError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }
}

impl From<StoreError> for ViewError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unauthorized => Self::SessionExpired,
            other => Self::Store(other),
        }
    }
}

/// A batch delete that the store only partly confirmed.
///
/// Not an error: local state is already reconciled to what was confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{deleted} of {requested} deleted")]
pub struct PartialDelete {
    pub deleted: usize,
    pub requested: usize,
}
