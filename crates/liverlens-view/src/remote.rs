use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info};

use liverlens_core::field::dataset;
use liverlens_core::models::filter::{Criterion, FilterSpec};
use liverlens_core::models::record::Record;
use liverlens_core::models::sort::SortSpec;
use liverlens_store::backend::ExploreStore;
use liverlens_store::explore::{ExploreQuery, ExploreStats};

use crate::error::ViewError;
use crate::paginate::DEFAULT_PAGE_SIZE;
use crate::predicate::{CompileOptions, parse_day, parse_number};

/// Browsing state for server-filtered mode. The server owns the collection,
/// so only the query inputs live here.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteView {
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub page: usize,
    pub page_size: usize,
}

impl Default for RemoteView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl RemoteView {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: FilterSpec::new(),
            sort: SortSpec::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn set_filter(mut self, filter: FilterSpec) -> Self {
        if filter != self.filter {
            self.filter = filter;
            self.page = 1;
        }
        self
    }

    pub fn edit_filter(self, edit: impl FnOnce(FilterSpec) -> FilterSpec) -> Self {
        let filter = edit(self.filter.clone());
        self.set_filter(filter)
    }

    pub fn clear_filters(self) -> Self {
        Self::new(self.page_size)
    }

    pub fn set_sort(mut self, sort: SortSpec) -> Self {
        if sort != self.sort {
            self.sort = sort;
            self.page = 1;
        }
        self
    }

    pub fn sort_by(self, key: &str) -> Self {
        let sort = self.sort.toggled(key);
        self.set_sort(sort)
    }

    /// The upper bound is only known to the server; see
    /// [`RemoteQueryAdapter::fetch`].
    pub fn set_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    /// Adopt the page the server actually answered for.
    pub fn apply(mut self, page: &RemotePage) -> Self {
        self.page = page.page;
        self
    }
}

/// An applied server page.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePage {
    pub seq: u64,
    pub page: usize,
    pub total_pages: usize,
    pub records: Vec<Record>,
    pub stats: ExploreStats,
}

/// Map active criteria onto the explore endpoint's named parameters.
///
/// Exact and search criteria use the field key; numeric ranges become
/// `min_<key>`/`max_<key>`; the record timestamp becomes
/// `date_from`/`date_to` (`YYYY-MM-DD`) and other dates
/// `<key>_from`/`<key>_to`. Unparseable bounds are omitted, matching the
/// client-side compiler.
pub fn filter_params(filter: &FilterSpec, opts: &CompileOptions) -> Vec<(String, String)> {
    let mut params = Vec::new();

    for (key, criterion) in filter.active() {
        let name = key.rsplit('.').next().unwrap_or(key);
        match criterion {
            Criterion::Exact { value } => params.push((name.to_string(), value.trim().to_string())),
            Criterion::Search { term, .. } => params.push((name.to_string(), term.trim().to_string())),
            Criterion::Range { min, max } => {
                let bounds = [("min", min), ("max", max)];
                for (side, raw) in bounds {
                    if let Some(raw) = raw.as_deref().map(str::trim)
                        && parse_number(raw).is_some()
                    {
                        params.push((format!("{side}_{name}"), raw.to_string()));
                    }
                }
            }
            Criterion::DateRange { from, to } => {
                let bounds = [("from", from), ("to", to)];
                for (side, raw) in bounds {
                    if let Some(day) = raw.as_deref().and_then(|r| parse_day(r, &opts.time_zone)) {
                        params.push((date_param(name, side), day.to_string()));
                    }
                }
            }
            Criterion::Within { window } => {
                if let Some(since) = window.since(&opts.now()) {
                    params.push((date_param(name, "from"), since.date().to_string()));
                }
            }
        }
    }

    params
}

fn date_param(name: &str, side: &str) -> String {
    if name == dataset::TIMESTAMP {
        format!("date_{side}")
    } else {
        format!("{name}_{side}")
    }
}

/// Issues explore queries and applies only the newest response.
///
/// Every [`fetch`](Self::fetch) takes a sequence number. A response is
/// applied only if no newer fetch has started by the time it arrives; older
/// responses (and their errors) are dropped. Nothing is cancelled on the
/// wire.
pub struct RemoteQueryAdapter<S> {
    store: S,
    options: CompileOptions,
    seq: AtomicU64,
    current: Mutex<Option<RemotePage>>,
}

impl<S: ExploreStore> RemoteQueryAdapter<S> {
    pub fn new(store: S, options: CompileOptions) -> Self {
        Self {
            store,
            options,
            seq: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    pub fn query_for(&self, view: &RemoteView) -> ExploreQuery {
        ExploreQuery {
            page: view.page.max(1),
            per_page: view.page_size.max(1),
            sort_key: view.sort.key.clone(),
            sort_direction: view.sort.direction,
            filters: filter_params(&view.filter, &self.options),
        }
    }

    /// Fetch the page for `view`.
    ///
    /// Returns `Ok(None)` when a newer fetch superseded this one. If the
    /// server reports fewer pages than requested, the query is re-issued for
    /// the last page.
    pub async fn fetch(&self, view: &RemoteView) -> Result<Option<RemotePage>, ViewError> {
        let seq = self.seq.fetch_add(1, Ordering::AcqRel) + 1;
        let mut query = self.query_for(view);

        let mut result = self.store.explore(&query).await;
        if let Ok(page) = &result
            && query.page > page.total_pages
            && self.is_latest(seq)
        {
            debug!(
                requested = query.page,
                total_pages = page.total_pages,
                "page out of range, re-querying last page"
            );
            query.page = page.total_pages;
            result = self.store.explore(&query).await;
        }

        let mut current = self.current.lock().await;
        if !self.is_latest(seq) {
            debug!(seq, latest = self.latest_seq(), "discarding stale explore response");
            return Ok(None);
        }

        let page = result?;
        let applied = RemotePage {
            seq,
            page: query.page.min(page.total_pages),
            total_pages: page.total_pages,
            records: page.records,
            stats: page.stats,
        };
        info!(
            seq,
            page = applied.page,
            total_pages = applied.total_pages,
            rows = applied.records.len(),
            "explore page applied"
        );
        *current = Some(applied.clone());
        Ok(Some(applied))
    }

    /// Supersede every fetch issued so far without starting a new one. Their
    /// responses are dropped when they land.
    pub fn invalidate(&self) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(seq, "explore fetches invalidated");
        seq
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.seq.load(Ordering::Acquire) == seq
    }

    /// Sequence number of the most recently issued fetch.
    pub fn latest_seq(&self) -> u64 {
        self.seq.load(Ordering::Acquire)
    }

    /// The last applied page.
    pub async fn current(&self) -> Option<RemotePage> {
        self.current.lock().await.clone()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
