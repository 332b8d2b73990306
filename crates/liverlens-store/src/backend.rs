use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use liverlens_core::models::record::Record;

use crate::client::StoreClient;
use crate::error::StoreError;
use crate::explore::{self, ExplorePage, ExploreQuery};
use crate::history::{self, BulkDeleteOutcome};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The backing collection for client-side browsing.
///
/// [`StoreClient`] is the production impl; tests swap in an in-memory one.
pub trait RecordStore: Send + Sync {
    /// Load every record visible to the operator.
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Record>, StoreError>>;

    /// Delete one record. `NotFound` means it was already gone.
    fn delete_one<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Delete a batch; the outcome reports how many were actually removed.
    fn delete_many<'a>(
        &'a self,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<BulkDeleteOutcome, StoreError>>;
}

/// A collaborator that filters, sorts and paginates on its side.
pub trait ExploreStore: Send + Sync {
    fn explore<'a>(
        &'a self,
        query: &'a ExploreQuery,
    ) -> BoxFuture<'a, Result<ExplorePage, StoreError>>;
}

impl RecordStore for StoreClient {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Record>, StoreError>> {
        Box::pin(history::fetch_history(self))
    }

    fn delete_one<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(history::delete_record(self, id))
    }

    fn delete_many<'a>(
        &'a self,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<BulkDeleteOutcome, StoreError>> {
        Box::pin(history::bulk_delete(self, ids))
    }
}

impl ExploreStore for StoreClient {
    fn explore<'a>(
        &'a self,
        query: &'a ExploreQuery,
    ) -> BoxFuture<'a, Result<ExplorePage, StoreError>> {
        Box::pin(explore::explore(self, query))
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Record>, StoreError>> {
        (**self).fetch_all()
    }

    fn delete_one<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        (**self).delete_one(id)
    }

    fn delete_many<'a>(
        &'a self,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<BulkDeleteOutcome, StoreError>> {
        (**self).delete_many(ids)
    }
}

impl<T: ExploreStore + ?Sized> ExploreStore for Arc<T> {
    fn explore<'a>(
        &'a self,
        query: &'a ExploreQuery,
    ) -> BoxFuture<'a, Result<ExplorePage, StoreError>> {
        (**self).explore(query)
    }
}
