use std::collections::BTreeMap;

use jiff::{ToSpan, Zoned};
use serde::{Deserialize, Serialize};

/// A single filter criterion, keyed by field in a [`FilterSpec`].
///
/// Bounds are kept as the operator typed them. Interpreting them (and
/// discarding what does not parse) is the predicate compiler's job, so an
/// unparseable bound means "unbounded" rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Criterion {
    /// Case-insensitive equality on a categorical field.
    Exact { value: String },
    /// Inclusive numeric range; either side may be absent.
    Range {
        min: Option<String>,
        max: Option<String>,
    },
    /// Case-insensitive substring match, OR-ed across `fields`.
    Search { term: String, fields: Vec<String> },
    /// Inclusive date range at day granularity.
    DateRange {
        from: Option<String>,
        to: Option<String>,
    },
    /// Records newer than a window ending now.
    Within { window: RelativeWindow },
}

impl Criterion {
    /// An unset criterion matches everything and is skipped at compile time.
    pub fn is_unset(&self) -> bool {
        match self {
            Self::Exact { value } => blank(value),
            Self::Range { min, max } => blank_opt(min) && blank_opt(max),
            Self::Search { term, fields } => blank(term) || fields.is_empty(),
            Self::DateRange { from, to } => blank_opt(from) && blank_opt(to),
            Self::Within { .. } => false,
        }
    }
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn blank_opt(s: &Option<String>) -> bool {
    s.as_deref().is_none_or(blank)
}

fn non_blank(s: &str) -> Option<String> {
    (!blank(s)).then(|| s.to_string())
}

/// Preset date windows offered by the history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeWindow {
    Today,
    Week,
    Month,
    Year,
}

impl RelativeWindow {
    /// Lower bound of the window relative to `now`.
    pub fn since(self, now: &Zoned) -> Option<Zoned> {
        match self {
            Self::Today => now.start_of_day().ok(),
            Self::Week => now.checked_sub(7.days()).ok(),
            Self::Month => now.checked_sub(1.month()).ok(),
            Self::Year => now.checked_sub(1.year()).ok(),
        }
    }
}

/// Per-field filter criteria. All set criteria are AND-ed together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    criteria: BTreeMap<String, Criterion>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, criterion: Criterion) -> Self {
        self.criteria.insert(key.to_string(), criterion);
        self
    }

    pub fn exact(self, field: &str, value: &str) -> Self {
        self.set(
            field,
            Criterion::Exact {
                value: value.to_string(),
            },
        )
    }

    /// Numeric range from raw input; empty strings leave that side open.
    pub fn range(self, field: &str, min: &str, max: &str) -> Self {
        self.set(
            field,
            Criterion::Range {
                min: non_blank(min),
                max: non_blank(max),
            },
        )
    }

    /// Substring search across `fields`, stored under `key`.
    pub fn search(self, key: &str, term: &str, fields: &[&str]) -> Self {
        self.set(
            key,
            Criterion::Search {
                term: term.to_string(),
                fields: fields.iter().map(|f| f.to_string()).collect(),
            },
        )
    }

    pub fn date_range(self, field: &str, from: &str, to: &str) -> Self {
        self.set(
            field,
            Criterion::DateRange {
                from: non_blank(from),
                to: non_blank(to),
            },
        )
    }

    pub fn within(self, field: &str, window: RelativeWindow) -> Self {
        self.set(field, Criterion::Within { window })
    }

    pub fn without(mut self, key: &str) -> Self {
        self.criteria.remove(key);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Criterion> {
        self.criteria.get(key)
    }

    /// Criteria that actually constrain the result, in key order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.criteria
            .iter()
            .filter(|(_, c)| !c.is_unset())
            .map(|(k, c)| (k.as_str(), c))
    }

    /// True when no criterion constrains anything.
    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }
}
