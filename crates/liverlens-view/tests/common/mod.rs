#![allow(dead_code)]

use std::sync::Arc;

use liverlens_core::field::FieldRegistry;
use liverlens_core::models::record::Record;
use liverlens_view::pipeline::{ViewContext, ViewState};
use liverlens_view::predicate::CompileOptions;

/// `n` dataset rows: `r01..rNN`, ages cycling 30..70, three `High` rows
/// (every ninth), one per day from 2025-01-01.
pub fn patients(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let risk = match i {
                _ if i % 9 == 0 => "High",
                _ if i % 2 == 0 => "Medium",
                _ => "Low",
            };
            Record::new(format!("r{:02}", i + 1))
                .with_field("age", 30 + (i % 5) as i64 * 10)
                .with_field("risk_level", risk)
                .with_field("sgot", 20.0 + i as f64 * 10.0)
                .with_field(
                    "timestamp",
                    format!("2025-01-{:02}T10:00:00", i % 28 + 1),
                )
        })
        .collect()
}

pub fn context() -> Arc<ViewContext> {
    Arc::new(ViewContext::new(
        FieldRegistry::dataset(),
        CompileOptions::default(),
    ))
}

pub fn loaded(n: usize) -> ViewState {
    ViewState::new(context()).with_records(patients(n))
}

pub fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}
