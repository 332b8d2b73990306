use std::collections::HashSet;
use std::sync::Arc;

use liverlens_core::field::FieldRegistry;
use liverlens_core::models::filter::FilterSpec;
use liverlens_core::models::record::Record;
use liverlens_core::models::sort::SortSpec;

use crate::paginate::{DEFAULT_PAGE_SIZE, PaginationState};
use crate::predicate::{CompileOptions, compile};
use crate::selection::Selection;
use crate::sort::sort_records;

/// What a view needs besides its state: which fields exist, and how date
/// bounds are interpreted.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    pub registry: FieldRegistry,
    pub options: CompileOptions,
}

impl ViewContext {
    pub fn new(registry: FieldRegistry, options: CompileOptions) -> Self {
        Self { registry, options }
    }
}

/// The rendered slice of the filtered, sorted collection.
#[derive(Debug, Clone, PartialEq)]
pub struct VisiblePage {
    pub rows: Vec<Record>,
    pub pagination: PaginationState,
    /// Records that passed the filter.
    pub matched: usize,
    /// Records in the raw collection.
    pub total: usize,
}

impl VisiblePage {
    pub fn ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.id.as_str()).collect()
    }
}

/// Filter, then sort, then slice. No state is read or written outside the
/// arguments.
pub fn recompute(
    records: &[Record],
    filter: &FilterSpec,
    sort: &SortSpec,
    requested_page: usize,
    page_size: usize,
    ctx: &ViewContext,
) -> VisiblePage {
    let predicate = compile(filter, &ctx.registry, &ctx.options);
    let matched: Vec<&Record> = records.iter().filter(|r| predicate.matches(r)).collect();
    let sorted = sort_records(matched, sort, &ctx.registry);

    let pagination = PaginationState::clamp(sorted.len(), page_size, requested_page);
    let rows = sorted[pagination.bounds()]
        .iter()
        .map(|r| (*r).clone())
        .collect();

    VisiblePage {
        rows,
        pagination,
        matched: sorted.len(),
        total: records.len(),
    }
}

/// Client-side browsing state.
///
/// Every transition consumes the state and returns a new one with the
/// visible page already recomputed, so a `ViewState` is always consistent:
/// the page is within `[1, total_pages]` and the selection is a subset of
/// the visible ids.
#[derive(Debug, Clone)]
pub struct ViewState {
    ctx: Arc<ViewContext>,
    records: Arc<Vec<Record>>,
    filter: FilterSpec,
    sort: SortSpec,
    page_size: usize,
    visible: VisiblePage,
    selection: Selection,
}

impl ViewState {
    pub fn new(ctx: Arc<ViewContext>) -> Self {
        Self::with_page_size(ctx, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(ctx: Arc<ViewContext>, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            ctx,
            records: Arc::new(Vec::new()),
            filter: FilterSpec::new(),
            sort: SortSpec::default(),
            page_size,
            visible: VisiblePage {
                rows: Vec::new(),
                pagination: PaginationState::clamp(0, page_size, 1),
                matched: 0,
                total: 0,
            },
            selection: Selection::default(),
        }
    }

    /// Replace the raw collection (initial load or refresh). The current page
    /// is kept and clamped; selected ids that are no longer visible drop out.
    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = Arc::new(records);
        self.refresh_visible(self.visible.pagination.page);
        self
    }

    pub fn set_filter(mut self, filter: FilterSpec) -> Self {
        if filter == self.filter {
            return self;
        }
        self.filter = filter;
        self.reset_view(1)
    }

    /// Apply an edit to the current filter.
    pub fn edit_filter(self, edit: impl FnOnce(FilterSpec) -> FilterSpec) -> Self {
        let filter = edit(self.filter.clone());
        self.set_filter(filter)
    }

    /// Reset filter, sort and page to their defaults.
    pub fn clear_filters(mut self) -> Self {
        self.filter = FilterSpec::new();
        self.sort = SortSpec::default();
        self.reset_view(1)
    }

    pub fn set_sort(mut self, sort: SortSpec) -> Self {
        if sort == self.sort {
            return self;
        }
        self.sort = sort;
        self.reset_view(1)
    }

    /// Header click: same key flips direction, a new key sorts ascending.
    pub fn sort_by(self, key: &str) -> Self {
        let sort = self.sort.toggled(key);
        self.set_sort(sort)
    }

    /// Go to `page`, clamped into range.
    pub fn set_page(self, page: usize) -> Self {
        let clamped = PaginationState::clamp(self.visible.matched, self.page_size, page).page;
        if clamped == self.visible.pagination.page {
            return self;
        }
        self.reset_view(clamped)
    }

    pub fn next_page(self) -> Self {
        let page = self.visible.pagination.page + 1;
        self.set_page(page)
    }

    pub fn previous_page(self) -> Self {
        let page = self.visible.pagination.page.saturating_sub(1);
        self.set_page(page)
    }

    pub fn toggle_selection(mut self, id: &str) -> Self {
        let visible = self.visible.ids();
        self.selection.toggle(id, &visible);
        self
    }

    pub fn select_all_visible(mut self) -> Self {
        let visible = self.visible.ids();
        self.selection.select_all_visible(&visible);
        self
    }

    pub fn clear_selection(mut self) -> Self {
        self.selection.clear();
        self
    }

    /// Drop `removed` from the raw collection, clear the selection and
    /// recompute. The page is kept and clamped.
    pub fn apply_bulk_delete(mut self, removed: &[String]) -> Self {
        let removed: HashSet<&str> = removed.iter().map(String::as_str).collect();
        let kept: Vec<Record> = self
            .records
            .iter()
            .filter(|r| !removed.contains(r.id.as_str()))
            .cloned()
            .collect();
        self.records = Arc::new(kept);
        let page = self.visible.pagination.page;
        self.reset_view(page)
    }

    fn reset_view(mut self, page: usize) -> Self {
        self.selection.clear();
        self.refresh_visible(page);
        self
    }

    fn refresh_visible(&mut self, page: usize) {
        self.visible = recompute(
            &self.records,
            &self.filter,
            &self.sort,
            page,
            self.page_size,
            &self.ctx,
        );
        self.selection.retain_visible(&self.visible.ids());
        debug_assert!(self.is_consistent());
    }

    /// Page within range and selection within the visible page.
    pub fn is_consistent(&self) -> bool {
        let p = &self.visible.pagination;
        let visible = self.visible.ids();
        p.page >= 1
            && p.page <= p.total_pages()
            && self.selection.ids().iter().all(|id| visible.contains(&id.as_str()))
            && (!self.selection.is_all_visible() || self.selection.len() == visible.len())
    }

    pub fn context(&self) -> &ViewContext {
        &self.ctx
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn visible(&self) -> &VisiblePage {
        &self.visible
    }

    pub fn pagination(&self) -> PaginationState {
        self.visible.pagination
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }
}
