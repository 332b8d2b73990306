//! History browsing end to end over an in-memory store.

use std::sync::{Arc, Mutex};

use liverlens_core::field::history;
use liverlens_core::models::filter::RelativeWindow;
use liverlens_core::models::record::Record;
use liverlens_session::config::EngineConfig;
use liverlens_session::history::HistorySession;
use liverlens_store::backend::{BoxFuture, RecordStore};
use liverlens_store::error::StoreError;
use liverlens_store::history::BulkDeleteOutcome;
use liverlens_view::error::ViewError;

#[derive(Default)]
struct MemoryStore {
    records: Mutex<Vec<Record>>,
    expired: bool,
    /// Bulk deletes confirm one fewer than requested.
    lossy: bool,
}

impl RecordStore for MemoryStore {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Record>, StoreError>> {
        Box::pin(async move {
            if self.expired {
                return Err(StoreError::Unauthorized);
            }
            Ok(self.records.lock().unwrap().clone())
        })
    }

    fn delete_one<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| r.id != id);
            if records.len() == before {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
            Ok(())
        })
    }

    fn delete_many<'a>(
        &'a self,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<BulkDeleteOutcome, StoreError>> {
        Box::pin(async move {
            let honoured = if self.lossy { &ids[1..] } else { ids };
            self.records
                .lock()
                .unwrap()
                .retain(|r| !honoured.contains(&r.id));
            Ok(BulkDeleteOutcome {
                message: String::new(),
                deleted_count: honoured.len(),
                deleted_ids: None,
            })
        })
    }
}

fn prediction(i: usize) -> Record {
    let (name, risk) = match i % 3 {
        0 => ("Ada Smith", "High"),
        1 => ("Bo Lee", "Medium"),
        _ => ("Cy Jones", "Low"),
    };
    Record::new(format!("{i:024x}"))
        .with_input("Patient_ID", format!("P-{i:03}"))
        .with_input("Patient_Name", name)
        .with_field("prediction", if i % 4 == 0 { "D" } else { "C" })
        .with_field("risk_level", risk)
        .with_field("timestamp", format!("2025-02-{:02}T09:30:00", i % 28 + 1))
}

fn store(n: usize) -> MemoryStore {
    MemoryStore {
        records: Mutex::new((0..n).map(prediction).collect()),
        ..MemoryStore::default()
    }
}

#[tokio::test]
async fn load_filter_and_page() {
    let mut session = HistorySession::new(store(30), &EngineConfig::default()).unwrap();

    let page = session.load().await.unwrap();
    assert_eq!(page.rows.len(), 10);
    assert_eq!(page.pagination.total_pages(), 3);
    // newest first
    assert_eq!(session.page().rows[0].id, format!("{:024x}", 27));

    session.set_page(3);
    session.filter_risk("high");
    assert_eq!(session.page().matched, 10);
    assert_eq!(session.page().pagination.page, 1);

    session.search("smith");
    assert_eq!(session.page().matched, 10);
    session.search("p-00");
    assert_eq!(session.page().matched, 4);
    assert_eq!(session.summary(), "Showing 4 of 30 records");

    session.clear_filters();
    assert_eq!(session.page().matched, 30);
}

#[tokio::test]
async fn relative_window_filters_by_timestamp() {
    let mut session = HistorySession::new(store(5), &EngineConfig::default()).unwrap();
    session.load().await.unwrap();

    session.filter_window(Some(RelativeWindow::Today));
    assert_eq!(session.page().matched, 0);

    session.filter_window(None);
    assert_eq!(session.page().matched, 5);
}

#[tokio::test]
async fn dropdown_options_come_from_the_collection() {
    let mut session = HistorySession::new(store(6), &EngineConfig::default()).unwrap();
    session.load().await.unwrap();

    assert_eq!(session.options_for(history::RISK_LEVEL), ["High", "Medium", "Low"]);
}

#[tokio::test]
async fn expired_session_keeps_previous_state() {
    let mut session = HistorySession::new(
        MemoryStore {
            expired: true,
            ..store(3)
        },
        &EngineConfig::default(),
    )
    .unwrap();

    let err = session.load().await.unwrap_err();
    assert!(matches!(err, ViewError::SessionExpired));
    assert!(session.view().records().is_empty());
}

#[tokio::test]
async fn bulk_delete_reports_shortfall() {
    let mut session = HistorySession::new(
        MemoryStore {
            lossy: true,
            ..store(12)
        },
        &EngineConfig::default(),
    )
    .unwrap();
    session.load().await.unwrap();
    session.select_all_visible();
    assert_eq!(session.view().selection().len(), 10);

    let shortfall = session.delete_selected().await.unwrap().unwrap();
    assert_eq!(shortfall.to_string(), "9 of 10 deleted");
    assert_eq!(session.view().records().len(), 3);
    assert!(session.view().selection().is_empty());
}

#[tokio::test]
async fn delete_twice_is_harmless() {
    let mut session = HistorySession::new(store(4), &EngineConfig::default()).unwrap();
    session.load().await.unwrap();
    let id = format!("{:024x}", 2);

    session.delete(&id).await.unwrap();
    session.delete(&id).await.unwrap();
    assert_eq!(session.view().records().len(), 3);
}

#[tokio::test]
async fn prediction_filter_narrows_and_clears() {
    let mut session = HistorySession::new(store(12), &EngineConfig::default()).unwrap();
    session.load().await.unwrap();

    session.filter_prediction("D");
    assert_eq!(session.page().matched, 3);
    assert_eq!(session.summary(), "Showing 3 of 12 records");

    session.filter_prediction("");
    assert_eq!(session.page().matched, 12);
}

#[tokio::test]
async fn reload_drops_a_selected_record_deleted_elsewhere() {
    let remote = Arc::new(store(5));
    let mut session = HistorySession::new(remote.clone(), &EngineConfig::default()).unwrap();
    session.load().await.unwrap();

    let first = session.page().rows[0].id.clone();
    let second = session.page().rows[1].id.clone();
    session.toggle_selection(&first);
    session.toggle_selection(&second);

    remote.records.lock().unwrap().retain(|r| r.id != first);
    session.load().await.unwrap();

    assert_eq!(session.view().records().len(), 4);
    assert_eq!(session.view().selection().ids(), [second]);
    assert!(session.view().is_consistent());
}
