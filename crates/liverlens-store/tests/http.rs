//! Client tests against an in-process axum stand-in for the Record Store
//! Service.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde_json::{Value, json};

use liverlens_core::models::sort::SortDirection;
use liverlens_store::backend::{ExploreStore, RecordStore};
use liverlens_store::client::StoreClient;
use liverlens_store::error::StoreError;
use liverlens_store::explore::ExploreQuery;
use liverlens_store::history::{self, HistoryQuery};

const TOTAL_HISTORY: usize = 150;

async fn serve(router: Router) -> StoreClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    StoreClient::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap()
}

async fn history_page(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = params.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(10);
    let patient = params.get("patient_id").cloned();

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(TOTAL_HISTORY);
    let predictions: Vec<Value> = (start..end)
        .map(|i| {
            json!({
                "_id": format!("rec-{i:03}"),
                "input_data": {
                    "Patient_ID": patient.clone().unwrap_or_else(|| format!("P-{i}")),
                    "Patient_Name": format!("Patient {i}"),
                },
                "prediction": "C",
                "risk_level": "Low",
                "timestamp": "2025-01-01T00:00:00"
            })
        })
        .collect();

    Json(json!({
        "predictions": predictions,
        "pagination": {
            "page": page,
            "per_page": per_page,
            "total_count": TOTAL_HISTORY,
            "total_pages": TOTAL_HISTORY.div_ceil(per_page),
        }
    }))
}

async fn delete_one(Path(id): Path<String>) -> impl IntoResponse {
    match id.as_str() {
        "gone" => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Prediction not found or not authorized" })),
        ),
        "expired" => (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Login required" }))),
        "broken" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to delete prediction" })),
        ),
        _ => (
            StatusCode::OK,
            Json(json!({ "message": "Prediction deleted successfully" })),
        ),
    }
}

async fn bulk_delete(Json(body): Json<Value>) -> Json<Value> {
    let ids = body["prediction_ids"].as_array().cloned().unwrap_or_default();
    // pretend the last id could not be deleted
    let deleted = ids.len().saturating_sub(1);
    Json(json!({ "message": format!("{deleted} predictions deleted"), "deleted_count": deleted }))
}

async fn explore(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("risk_level").map(String::as_str) == Some("Forbidden") {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Researcher role required" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "records": [
                { "record_id": 7, "age": 52.0, "risk_level": "High" },
                { "record_id": 8, "age": 61.0, "risk_level": "High" }
            ],
            "stats": { "total_records": 2, "avg_age": 56.5, "echo": params },
            "pagination": { "total_pages": 4 }
        })),
    )
}

fn router() -> Router {
    Router::new()
        .route("/history", get(history_page))
        .route("/history/bulk-delete", delete(bulk_delete))
        .route("/history/{id}", delete(delete_one))
        .route("/api/explore", get(explore))
}

#[tokio::test]
async fn fetch_all_follows_pagination() {
    let client = serve(router()).await;
    let records = client.fetch_all().await.unwrap();

    assert_eq!(records.len(), TOTAL_HISTORY);
    assert_eq!(records[0].id, "rec-000");
    assert_eq!(records[TOTAL_HISTORY - 1].id, "rec-149");
}

#[tokio::test]
async fn single_page_fetch_passes_patient_filter() {
    let client = serve(router()).await;
    let query = HistoryQuery {
        page: Some(2),
        per_page: Some(10),
        patient_id: Some("P-777".to_string()),
    };
    let page = history::fetch_history_page(&client, &query).await.unwrap();

    assert_eq!(page.predictions.len(), 10);
    assert_eq!(page.predictions[0].id, "rec-010");
    assert_eq!(
        page.predictions[0].input_data["Patient_ID"],
        json!("P-777")
    );
    let pagination = page.pagination.unwrap();
    assert_eq!(pagination.total_pages, 15);
}

#[tokio::test]
async fn delete_status_codes_map_to_store_errors() {
    let client = serve(router()).await;

    client.delete_one("rec-001").await.unwrap();

    match client.delete_one("gone").await {
        Err(StoreError::NotFound { id }) => assert_eq!(id, "gone"),
        other => panic!("expected NotFound, got {other:?}"),
    }

    let expired = client.delete_one("expired").await.unwrap_err();
    assert!(expired.is_unauthorized());
    assert!(!expired.is_retryable());

    match client.delete_one("broken").await {
        Err(StoreError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Failed to delete prediction");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn bulk_delete_reports_confirmed_count() {
    let client = serve(router()).await;
    let ids: Vec<String> = (0..5).map(|i| format!("rec-{i}")).collect();

    let outcome = client.delete_many(&ids).await.unwrap();
    assert_eq!(outcome.deleted_count, 4);
    assert_eq!(outcome.deleted_ids, None);
}

#[tokio::test]
async fn explore_sends_named_params_and_decodes_page() {
    let client = serve(router()).await;
    let query = ExploreQuery {
        page: 2,
        per_page: 10,
        sort_key: "age".to_string(),
        sort_direction: SortDirection::Desc,
        filters: vec![
            ("risk_level".to_string(), "High".to_string()),
            ("min_age".to_string(), "40".to_string()),
        ],
    };

    let page = client.explore(&query).await.unwrap();
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].id, "7");
    assert_eq!(page.total_pages, 4);
    assert_eq!(page.stats.total_records, 2);
    assert_eq!(page.stats.average("age"), Some(56.5));

    let echo = &page.stats.extra["echo"];
    assert_eq!(echo["page"], json!("2"));
    assert_eq!(echo["sort_key"], json!("age"));
    assert_eq!(echo["sort_direction"], json!("desc"));
    assert_eq!(echo["min_age"], json!("40"));
    assert!(echo.get("max_age").is_none());
}

#[tokio::test]
async fn explore_forbidden_carries_server_message() {
    let client = serve(router()).await;
    let query = ExploreQuery {
        page: 1,
        per_page: 10,
        sort_key: "timestamp".to_string(),
        sort_direction: SortDirection::Desc,
        filters: vec![("risk_level".to_string(), "Forbidden".to_string())],
    };

    match client.explore(&query).await {
        Err(StoreError::Forbidden(msg)) => assert_eq!(msg, "Researcher role required"),
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_retryable() {
    // bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = StoreClient::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = client.fetch_all().await.unwrap_err();
    assert!(err.is_retryable(), "got {err:?}");
}

#[test]
fn rejects_invalid_base_url() {
    assert!(matches!(
        StoreClient::new("not a url", Duration::from_secs(1)),
        Err(StoreError::Config(_))
    ));
}
