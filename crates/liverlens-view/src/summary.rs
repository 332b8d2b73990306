use std::collections::HashSet;

use serde::Serialize;

use liverlens_core::field::{FieldDef, FieldKind, FieldRegistry};
use liverlens_core::models::record::Record;

use crate::pipeline::VisiblePage;

/// "Showing N of M records": records matching the filter out of the whole
/// collection.
pub fn showing(page: &VisiblePage) -> String {
    format!("Showing {} of {} records", page.matched, page.total)
}

/// Distinct non-empty values of `key`, in first-seen order.
pub fn distinct_values(records: &[Record], registry: &FieldRegistry, key: &str) -> Vec<String> {
    let field = registry.resolve(key, FieldKind::Categorical);
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| field.text(r))
        .map(|t| t.into_owned())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

pub const RISK_LEVELS: [&str; 3] = ["High", "Medium", "Low"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskShare {
    pub name: &'static str,
    pub value: usize,
    /// Share of all records, one decimal place.
    pub percentage: f64,
}

/// Count of High/Medium/Low risk levels. Records with any other (or no)
/// level still count towards the total.
pub fn risk_breakdown(records: &[Record], field: &FieldDef) -> Vec<RiskShare> {
    let total = records.len();
    RISK_LEVELS
        .iter()
        .map(|&name| {
            let value = records
                .iter()
                .filter(|r| field.text(r).is_some_and(|t| t.eq_ignore_ascii_case(name)))
                .count();
            RiskShare {
                name,
                value,
                percentage: percentage(value, total),
            }
        })
        .collect()
}

fn percentage(value: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (value as f64 / total as f64 * 1000.0).round() / 10.0
}

/// A histogram bucket: values above the previous bucket's `max` up to and
/// including this one's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub label: &'static str,
    pub max: f64,
}

pub const SGOT_BUCKETS: [Bucket; 4] = [
    Bucket { label: "0-50", max: 50.0 },
    Bucket { label: "51-100", max: 100.0 },
    Bucket { label: "101-200", max: 200.0 },
    Bucket { label: "201+", max: f64::INFINITY },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub range: &'static str,
    pub count: usize,
}

/// Count numeric values of `field` into `buckets`. Negative and missing
/// values are skipped.
pub fn histogram(records: &[Record], field: &FieldDef, buckets: &[Bucket]) -> Vec<BucketCount> {
    let mut counts: Vec<BucketCount> = buckets
        .iter()
        .map(|b| BucketCount {
            range: b.label,
            count: 0,
        })
        .collect();

    for value in records.iter().filter_map(|r| field.number(r)) {
        if value < 0.0 {
            continue;
        }
        if let Some(i) = buckets.iter().position(|b| value <= b.max) {
            counts[i].count += 1;
        }
    }
    counts
}
