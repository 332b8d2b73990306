use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use liverlens_core::models::filter::FilterSpec;
use liverlens_store::backend::ExploreStore;
use liverlens_view::debounce::Debouncer;
use liverlens_view::error::ViewError;
use liverlens_view::remote::{RemotePage, RemoteQueryAdapter, RemoteView};

use crate::config::EngineConfig;

/// Outcome of a debounced fetch, delivered on the session's event channel.
#[derive(Debug)]
pub enum ExplorerEvent {
    Page(RemotePage),
    Failed(ViewError),
}

/// The dataset explorer: the server filters, sorts and pages.
///
/// Filter edits are debounced; page and sort changes are fetched right away
/// and supersede any pending edit. A filter edit also supersedes fetches
/// already in flight, so results for old criteria never reach the caller.
pub struct ExplorerSession<S> {
    adapter: Arc<RemoteQueryAdapter<S>>,
    view: RemoteView,
    debouncer: Debouncer,
    events: mpsc::UnboundedSender<ExplorerEvent>,
}

impl<S: ExploreStore + 'static> ExplorerSession<S> {
    pub fn new(
        store: S,
        config: &EngineConfig,
    ) -> eyre::Result<(Self, mpsc::UnboundedReceiver<ExplorerEvent>)> {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Self {
            adapter: Arc::new(RemoteQueryAdapter::new(store, config.compile_options()?)),
            view: RemoteView::new(config.page_size),
            debouncer: Debouncer::new(config.debounce()),
            events,
        };
        Ok((session, rx))
    }

    pub fn view(&self) -> &RemoteView {
        &self.view
    }

    pub async fn current(&self) -> Option<RemotePage> {
        self.adapter.current().await
    }

    /// Must be called from within a tokio runtime.
    pub fn edit_filter(&mut self, edit: impl FnOnce(FilterSpec) -> FilterSpec) {
        let next = self.view.clone().edit_filter(edit);
        self.schedule(next);
    }

    /// Reset filter, sort and page. Debounced like any other filter edit.
    pub fn clear_filters(&mut self) {
        let next = self.view.clone().clear_filters();
        self.schedule(next);
    }

    fn schedule(&mut self, next: RemoteView) {
        if next == self.view {
            return;
        }
        self.view = next;
        self.adapter.invalidate();

        let adapter = self.adapter.clone();
        let view = self.view.clone();
        let events = self.events.clone();
        self.debouncer.schedule(async move {
            let event = match adapter.fetch(&view).await {
                Ok(Some(page)) => ExplorerEvent::Page(page),
                Ok(None) => return,
                Err(e) => ExplorerEvent::Failed(e),
            };
            if events.send(event).is_err() {
                debug!("explorer closed before page arrived");
            }
        });
    }

    /// Fetch now, dropping any pending filter edit timer.
    pub async fn refresh(&mut self) -> Result<Option<RemotePage>, ViewError> {
        self.debouncer.cancel();
        let page = self.adapter.fetch(&self.view).await?;
        if let Some(page) = &page {
            self.apply(page);
        }
        Ok(page)
    }

    pub async fn set_page(&mut self, page: usize) -> Result<Option<RemotePage>, ViewError> {
        self.view = self.view.clone().set_page(page);
        self.refresh().await
    }

    pub async fn sort_by(&mut self, key: &str) -> Result<Option<RemotePage>, ViewError> {
        self.view = self.view.clone().sort_by(key);
        self.refresh().await
    }

    /// Adopt a page delivered as an [`ExplorerEvent`], so the view tracks a
    /// server-side clamp.
    pub fn apply(&mut self, page: &RemotePage) {
        self.view = self.view.clone().apply(page);
    }
}
