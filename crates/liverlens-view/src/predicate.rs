use jiff::civil;
use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};
use tracing::debug;

use liverlens_core::field::{FieldDef, FieldKind, FieldRegistry};
use liverlens_core::models::filter::{Criterion, FilterSpec};
use liverlens_core::models::record::{Record, parse_timestamp};

/// Inputs to predicate compilation that are not part of the filter itself.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Zone that defines where a day starts and ends for date bounds.
    pub time_zone: TimeZone,
    /// Reference instant for relative windows. `None` means "now".
    pub now: Option<Timestamp>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            time_zone: TimeZone::UTC,
            now: None,
        }
    }
}

impl CompileOptions {
    pub fn now(&self) -> Zoned {
        self.now
            .unwrap_or_else(Timestamp::now)
            .to_zoned(self.time_zone.clone())
    }
}

#[derive(Debug, Clone)]
enum Clause {
    Exact {
        field: FieldDef,
        value: String,
    },
    Range {
        field: FieldDef,
        min: Option<f64>,
        max: Option<f64>,
    },
    Search {
        fields: Vec<FieldDef>,
        needle: String,
    },
    Between {
        field: FieldDef,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    },
}

impl Clause {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Exact { field, value } => exact_match(field, record, value),
            Self::Range { field, min, max } => match field.number(record) {
                Some(n) => min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi),
                None => false,
            },
            Self::Search { fields, needle } => fields.iter().any(|f| {
                f.text(record)
                    .is_some_and(|t| t.to_lowercase().contains(needle.as_str()))
            }),
            Self::Between { field, from, to } => match field.timestamp(record) {
                Some(ts) => from.is_none_or(|lo| ts >= lo) && to.is_none_or(|hi| ts <= hi),
                None => false,
            },
        }
    }
}

/// A compiled filter: every clause must hold.
///
/// An empty predicate accepts everything.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.iter().all(|c| c.matches(record))
    }

    pub fn is_identity(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Consume into a plain closure.
    pub fn into_fn(self) -> impl Fn(&Record) -> bool {
        move |record| self.matches(record)
    }
}

/// Compile a filter spec against a field registry.
///
/// Unset criteria are skipped. Bounds that do not parse are dropped; a range
/// left with no usable bound at all is skipped entirely, so it behaves the
/// same as an unset criterion.
pub fn compile(spec: &FilterSpec, registry: &FieldRegistry, opts: &CompileOptions) -> Predicate {
    let mut clauses = Vec::new();

    for (key, criterion) in spec.active() {
        let clause = match criterion {
            Criterion::Exact { value } => Some(Clause::Exact {
                field: resolve(registry, key, FieldKind::Categorical),
                value: normalize(value),
            }),
            Criterion::Range { min, max } => {
                let min = min.as_deref().and_then(parse_number);
                let max = max.as_deref().and_then(parse_number);
                (min.is_some() || max.is_some()).then(|| Clause::Range {
                    field: resolve(registry, key, FieldKind::Numeric),
                    min,
                    max,
                })
            }
            Criterion::Search { term, fields } => Some(Clause::Search {
                fields: fields
                    .iter()
                    .map(|f| resolve(registry, f, FieldKind::Text))
                    .collect(),
                needle: term.trim().to_lowercase(),
            }),
            Criterion::DateRange { from, to } => {
                let tz = &opts.time_zone;
                let from = from
                    .as_deref()
                    .and_then(|raw| parse_day(raw, tz))
                    .and_then(|day| start_of_day(day, tz));
                let to = to
                    .as_deref()
                    .and_then(|raw| parse_day(raw, tz))
                    .and_then(|day| end_of_day(day, tz));
                (from.is_some() || to.is_some()).then(|| Clause::Between {
                    field: resolve(registry, key, FieldKind::Timestamp),
                    from,
                    to,
                })
            }
            Criterion::Within { window } => {
                window.since(&opts.now()).map(|since| Clause::Between {
                    field: resolve(registry, key, FieldKind::Timestamp),
                    from: Some(since.timestamp()),
                    to: None,
                })
            }
        };

        match clause {
            Some(c) => clauses.push(c),
            None => debug!(field = key, "filter bounds unparseable, treating as unbounded"),
        }
    }

    Predicate { clauses }
}

fn resolve(registry: &FieldRegistry, key: &str, fallback: FieldKind) -> FieldDef {
    if registry.get(key).is_none() {
        debug!(field = key, ?fallback, "filtering on unregistered field");
    }
    registry.resolve(key, fallback)
}

fn exact_match(field: &FieldDef, record: &Record, wanted: &str) -> bool {
    if field.kind == FieldKind::Numeric
        && let (Some(have), Some(want)) = (field.number(record), parse_number(wanted))
    {
        return have == want;
    }
    field
        .text(record)
        .is_some_and(|have| normalize(&have) == wanted)
}

/// Lower-case and fold boolean spellings onto the `y`/`n` flag form.
fn normalize(value: &str) -> String {
    let value = value.trim().to_lowercase();
    match value.as_str() {
        "yes" | "true" => "y".to_string(),
        "no" | "false" => "n".to_string(),
        _ => value,
    }
}

/// Parse a textual numeric bound. Empty or non-numeric input is absent.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a date bound down to its calendar day in `tz`.
pub fn parse_day(raw: &str, tz: &TimeZone) -> Option<civil::Date> {
    let raw = raw.trim();
    if let Ok(day) = raw.parse::<civil::Date>() {
        return Some(day);
    }
    parse_timestamp(raw).map(|ts| ts.to_zoned(tz.clone()).date())
}

fn start_of_day(day: civil::Date, tz: &TimeZone) -> Option<Timestamp> {
    day.to_zoned(tz.clone()).ok().map(|z| z.timestamp())
}

fn end_of_day(day: civil::Date, tz: &TimeZone) -> Option<Timestamp> {
    day.at(23, 59, 59, 999_999_999)
        .to_zoned(tz.clone())
        .ok()
        .map(|z| z.timestamp())
}
