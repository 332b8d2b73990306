use tracing::{info, warn};

use liverlens_core::field::{FieldRegistry, history};
use liverlens_core::models::filter::{FilterSpec, RelativeWindow};
use liverlens_store::backend::RecordStore;
use liverlens_view::error::{PartialDelete, ViewError};
use liverlens_view::mutate::{Mutation, MutationCoordinator};
use liverlens_view::pipeline::{ViewState, VisiblePage};
use liverlens_view::summary;

use crate::config::EngineConfig;

/// Filter key of the patient id/name search box.
pub const SEARCH_KEY: &str = "search";

/// The prediction history page: the whole collection is held locally and
/// filtered, sorted and paged in memory.
pub struct HistorySession<S> {
    coordinator: MutationCoordinator<S>,
    view: ViewState,
}

impl<S: RecordStore> HistorySession<S> {
    pub fn new(store: S, config: &EngineConfig) -> eyre::Result<Self> {
        let ctx = config.view_context(FieldRegistry::history())?;
        Ok(Self {
            coordinator: MutationCoordinator::new(store),
            view: ViewState::with_page_size(ctx, config.page_size),
        })
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn page(&self) -> &VisiblePage {
        self.view.visible()
    }

    /// Initial load or refresh. The previous collection is replaced
    /// wholesale; on error it is left as it was.
    pub async fn load(&mut self) -> Result<&VisiblePage, ViewError> {
        let records = self.coordinator.store().fetch_all().await?;
        info!(count = records.len(), "history view loaded");
        self.update(|view| view.with_records(records));
        Ok(self.view.visible())
    }

    fn update(&mut self, transition: impl FnOnce(ViewState) -> ViewState) {
        self.view = transition(self.view.clone());
    }

    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.update(|view| view.set_filter(filter));
    }

    /// Search patient id or name.
    pub fn search(&mut self, term: &str) {
        self.update(|view| {
            view.edit_filter(|f| {
                f.search(
                    SEARCH_KEY,
                    term,
                    &[history::PATIENT_ID, history::PATIENT_NAME],
                )
            })
        });
    }

    /// An empty `level` removes the risk filter.
    pub fn filter_risk(&mut self, level: &str) {
        self.update(|view| view.edit_filter(|f| f.exact(history::RISK_LEVEL, level)));
    }

    /// An empty `label` removes the prediction filter.
    pub fn filter_prediction(&mut self, label: &str) {
        self.update(|view| view.edit_filter(|f| f.exact(history::PREDICTION, label)));
    }

    /// `None` removes the date window.
    pub fn filter_window(&mut self, window: Option<RelativeWindow>) {
        self.update(|view| {
            view.edit_filter(|f| match window {
                Some(window) => f.within(history::TIMESTAMP, window),
                None => f.without(history::TIMESTAMP),
            })
        });
    }

    pub fn clear_filters(&mut self) {
        self.update(ViewState::clear_filters);
    }

    pub fn sort_by(&mut self, key: &str) {
        self.update(|view| view.sort_by(key));
    }

    pub fn set_page(&mut self, page: usize) {
        self.update(|view| view.set_page(page));
    }

    pub fn toggle_selection(&mut self, id: &str) {
        self.update(|view| view.toggle_selection(id));
    }

    pub fn select_all_visible(&mut self) {
        self.update(ViewState::select_all_visible);
    }

    pub fn clear_selection(&mut self) {
        self.update(ViewState::clear_selection);
    }

    /// Options for a categorical filter dropdown.
    pub fn options_for(&self, key: &str) -> Vec<String> {
        summary::distinct_values(self.view.records(), &self.view.context().registry, key)
    }

    pub fn summary(&self) -> String {
        summary::showing(self.view.visible())
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ViewError> {
        let mutation = self.coordinator.delete_one(&self.view, id).await?;
        self.view = mutation.view;
        Ok(())
    }

    /// Delete the selection. `Ok(Some(_))` is a partial delete: the view
    /// already reflects what the store confirmed. A view the coordinator could
    /// not reconcile is reloaded here once.
    pub async fn delete_selected(&mut self) -> Result<Option<PartialDelete>, ViewError> {
        let Mutation {
            view,
            shortfall,
            stale,
            ..
        } = self.coordinator.delete_selected(&self.view).await?;
        self.view = view;
        if stale && let Err(e) = self.load().await {
            warn!(error = %e, "reload after partial delete failed");
        }
        Ok(shortfall)
    }
}
