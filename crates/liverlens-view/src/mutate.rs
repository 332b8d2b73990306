use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use liverlens_store::backend::RecordStore;
use liverlens_store::error::StoreError;

use crate::error::{PartialDelete, ViewError};
use crate::pipeline::ViewState;

/// Result of a successful delete.
#[derive(Debug, Clone)]
pub struct Mutation {
    /// The view with removed ids dropped, selection cleared, and the page
    /// recomputed.
    pub view: ViewState,
    /// Ids dropped from the local collection.
    pub removed: Vec<String>,
    pub requested: usize,
    /// Set when the store confirmed fewer deletions than requested.
    pub shortfall: Option<PartialDelete>,
    /// The store changed but the local collection could not be reconciled.
    /// `view` still holds the pre-delete records and needs a reload.
    pub stale: bool,
}

/// Issues deletes against the store and reconciles the local view.
///
/// At most one delete is outstanding per coordinator. Methods borrow the
/// caller's [`ViewState`] and return a new one, so on any error the caller's
/// state is exactly what it was before.
pub struct MutationCoordinator<S> {
    store: S,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: RecordStore> MutationCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<InFlight<'_>, ViewError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ViewError::MutationInFlight)?;
        Ok(InFlight(&self.in_flight))
    }

    /// Delete a single record.
    ///
    /// A 404 means the record is already gone: it is dropped locally and the
    /// collection is refreshed. If that refresh fails the local drop stands.
    pub async fn delete_one(&self, view: &ViewState, id: &str) -> Result<Mutation, ViewError> {
        let _guard = self.begin()?;
        let removed = vec![id.to_string()];

        match self.store.delete_one(id).await {
            Ok(()) => {
                info!(id, "record deleted");
                Ok(Mutation {
                    view: view.clone().apply_bulk_delete(&removed),
                    removed,
                    requested: 1,
                    shortfall: None,
                    stale: false,
                })
            }
            Err(StoreError::NotFound { .. }) => {
                warn!(id, "record already absent, refreshing");
                let mut next = view.clone().apply_bulk_delete(&removed);
                match self.store.fetch_all().await {
                    Ok(records) => next = next.with_records(records),
                    Err(e) => warn!(error = %e, "refresh after delete failed"),
                }
                Ok(Mutation {
                    view: next,
                    removed,
                    requested: 1,
                    shortfall: None,
                    stale: false,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every selected record in one batch request.
    ///
    /// The shortfall is judged from the count the store confirms. The local
    /// collection drops only confirmed ids; when the store reports a short
    /// count without ids, the collection is re-fetched to learn which records
    /// are gone. If that re-fetch fails the mutation comes back `stale` with
    /// the selection cleared and the old records kept.
    pub async fn delete_selected(&self, view: &ViewState) -> Result<Mutation, ViewError> {
        let ids = view.selection().ids();
        if ids.is_empty() {
            return Err(ViewError::EmptySelection);
        }
        let _guard = self.begin()?;
        let requested = ids.len();

        let outcome = self.store.delete_many(&ids).await?;

        let confirmed = outcome
            .deleted_ids
            .as_ref()
            .map_or(outcome.deleted_count, Vec::len);
        let shortfall = (confirmed < requested).then_some(PartialDelete {
            deleted: confirmed,
            requested,
        });

        let (next, removed, stale) = match outcome.deleted_ids {
            Some(reported) => {
                let asked: HashSet<&str> = ids.iter().map(String::as_str).collect();
                let removed: Vec<String> = reported
                    .into_iter()
                    .filter(|id| asked.contains(id.as_str()))
                    .collect();
                (view.clone().apply_bulk_delete(&removed), removed, false)
            }
            None if confirmed >= requested => (view.clone().apply_bulk_delete(&ids), ids, false),
            None => {
                warn!(
                    requested,
                    deleted = confirmed,
                    "store confirmed fewer deletions than requested, re-fetching"
                );
                match self.store.fetch_all().await {
                    Ok(records) => {
                        let present: HashSet<&str> =
                            records.iter().map(|r| r.id.as_str()).collect();
                        let removed: Vec<String> = ids
                            .iter()
                            .filter(|id| !present.contains(id.as_str()))
                            .cloned()
                            .collect();
                        let next = view.clone().with_records(records).apply_bulk_delete(&removed);
                        (next, removed, false)
                    }
                    Err(e) => {
                        warn!(error = %e, "re-fetch after partial delete failed, view is stale");
                        (view.clone().clear_selection(), Vec::new(), true)
                    }
                }
            }
        };

        match &shortfall {
            Some(partial) => warn!(%partial, "partial bulk delete"),
            None => info!(count = requested, "bulk delete applied"),
        }

        Ok(Mutation {
            view: next,
            removed,
            requested,
            shortfall,
            stale,
        })
    }
}
