use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use liverlens_core::models::record::Record;
use liverlens_core::models::sort::SortDirection;

use crate::client::{StoreClient, check_status};
use crate::error::StoreError;

/// A server-side filtered, sorted, paginated query against `/api/explore`.
///
/// `filters` are already-named query parameters (`risk_level`, `min_age`,
/// `date_from`, ...); unset filters are simply not present.
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreQuery {
    pub page: usize,
    pub per_page: usize,
    pub sort_key: String,
    pub sort_direction: SortDirection,
    pub filters: Vec<(String, String)>,
}

impl ExploreQuery {
    /// Full query string parameters, paging and sort first.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
            ("sort_key".to_string(), self.sort_key.clone()),
            (
                "sort_direction".to_string(),
                self.sort_direction.as_str().to_string(),
            ),
        ];
        params.extend(self.filters.iter().cloned());
        params
    }

    pub fn filter(&self, name: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Aggregate statistics the explorer shows above the table.
///
/// `total_records` is always present; the `avg_*` figures depend on which
/// columns the server aggregates and are kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExploreStats {
    #[serde(default)]
    pub total_records: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExploreStats {
    /// `avg_<field>`, when the server reported it.
    pub fn average(&self, field: &str) -> Option<f64> {
        self.extra.get(&format!("avg_{field}"))?.as_f64()
    }
}

#[derive(Debug, Default, Deserialize)]
struct PaginationBody {
    #[serde(default)]
    total_pages: usize,
}

#[derive(Debug, Deserialize)]
struct ExploreBody {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    stats: Option<ExploreStats>,
    #[serde(default)]
    pagination: Option<PaginationBody>,
}

/// One page of server-filtered records plus aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorePage {
    pub records: Vec<Record>,
    pub stats: ExploreStats,
    /// Never less than 1.
    pub total_pages: usize,
}

impl From<ExploreBody> for ExplorePage {
    fn from(body: ExploreBody) -> Self {
        let total_pages = body.pagination.unwrap_or_default().total_pages.max(1);
        Self {
            records: body.records,
            stats: body.stats.unwrap_or_default(),
            total_pages,
        }
    }
}

/// Run an explore query.
pub async fn explore(client: &StoreClient, query: &ExploreQuery) -> Result<ExplorePage, StoreError> {
    let url = client.endpoint(&["api", "explore"])?;
    debug!(page = query.page, sort = %query.sort_key, filters = query.filters.len(), "explore query");

    let resp = client.http.get(url).query(&query.params()).send().await?;
    let resp = check_status(resp, None).await?;
    let body = resp.json::<ExploreBody>().await?;
    Ok(body.into())
}
