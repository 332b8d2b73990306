use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use liverlens_core::models::record::Record;

use crate::client::{StoreClient, check_status};
use crate::error::StoreError;

/// Page size used when walking the whole history.
pub const FETCH_ALL_PAGE_SIZE: usize = 100;

/// Pagination metadata attached to a `/history` page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

/// Body of `GET /history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub predictions: Vec<Record>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Query for a single `/history` page.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub patient_id: Option<String>,
}

#[derive(Serialize)]
struct BulkDeleteRequest<'a> {
    prediction_ids: &'a [String],
}

/// Body of `DELETE /history/bulk-delete`.
///
/// `deleted_ids` is optional: when the service names the removed ids the
/// engine drops exactly those, otherwise it only has the count to go on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteOutcome {
    #[serde(default)]
    pub message: String,
    pub deleted_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_ids: Option<Vec<String>>,
}

/// Fetch one page of the operator's history.
pub async fn fetch_history_page(
    client: &StoreClient,
    query: &HistoryQuery,
) -> Result<HistoryPage, StoreError> {
    let url = client.endpoint(&["history"])?;

    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(page) = query.page {
        params.push(("page", page.to_string()));
    }
    if let Some(per_page) = query.per_page {
        params.push(("per_page", per_page.to_string()));
    }
    if let Some(patient_id) = query.patient_id.as_deref().filter(|p| !p.is_empty()) {
        params.push(("patient_id", patient_id.to_string()));
    }

    let resp = client.http.get(url).query(&params).send().await?;
    let resp = check_status(resp, None).await?;
    Ok(resp.json::<HistoryPage>().await?)
}

/// Fetch the full history, following pagination metadata when the service
/// returns it.
pub async fn fetch_history(client: &StoreClient) -> Result<Vec<Record>, StoreError> {
    let mut records = Vec::new();
    let mut page = 1;

    loop {
        let query = HistoryQuery {
            page: Some(page),
            per_page: Some(FETCH_ALL_PAGE_SIZE),
            patient_id: None,
        };
        let body = fetch_history_page(client, &query).await?;
        let fetched = body.predictions.len();
        records.extend(body.predictions);

        match body.pagination {
            Some(p) if page < p.total_pages && fetched > 0 => {
                debug!(page, total_pages = p.total_pages, "fetching next history page");
                page += 1;
            }
            _ => break,
        }
    }

    info!(count = records.len(), "history loaded");
    Ok(records)
}

/// Delete a single record.
///
/// A 404 surfaces as [`StoreError::NotFound`]; callers treat that as
/// "already gone".
pub async fn delete_record(client: &StoreClient, id: &str) -> Result<(), StoreError> {
    let url = client.endpoint(&["history", id])?;
    let resp = client.http.delete(url).send().await?;
    check_status(resp, Some(id)).await?;
    info!(id, "record deleted");
    Ok(())
}

/// Delete a batch of records in one request.
pub async fn bulk_delete(
    client: &StoreClient,
    ids: &[String],
) -> Result<BulkDeleteOutcome, StoreError> {
    let url = client.endpoint(&["history", "bulk-delete"])?;
    let resp = client
        .http
        .delete(url)
        .json(&BulkDeleteRequest { prediction_ids: ids })
        .send()
        .await?;
    let resp = check_status(resp, None).await?;
    let outcome = resp.json::<BulkDeleteOutcome>().await?;
    info!(
        requested = ids.len(),
        deleted = outcome.deleted_count,
        "bulk delete completed"
    );
    Ok(outcome)
}
