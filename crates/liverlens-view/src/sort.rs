use std::cmp::Ordering;

use jiff::Timestamp;

use liverlens_core::field::{FieldDef, FieldKind, FieldRegistry};
use liverlens_core::models::record::{Record, Scalar};
use liverlens_core::models::sort::{SortDirection, SortSpec};

/// An extracted sort key.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Number(f64),
    Time(Timestamp),
    Text(String),
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Time(_) => 1,
            Self::Text(_) => 2,
        }
    }

    fn compare_to(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn sort_value(field: &FieldDef, record: &Record) -> Option<SortValue> {
    match field.kind {
        FieldKind::Numeric => field.number(record).map(SortValue::Number),
        FieldKind::Timestamp => field.timestamp(record).map(SortValue::Time),
        FieldKind::Categorical | FieldKind::Flag | FieldKind::Text => field
            .text(record)
            .map(|t| SortValue::Text(t.into_owned())),
    }
}

/// Ad-hoc sort keys take their kind from the value itself.
fn infer_value(field: &FieldDef, record: &Record) -> Option<SortValue> {
    match field.scalar(record)? {
        Scalar::Number(n) => Some(SortValue::Number(n)),
        _ => field.text(record).map(|t| SortValue::Text(t.into_owned())),
    }
}

/// Missing values sort last in both directions; only present values are
/// affected by the direction.
fn compare(a: Option<&SortValue>, b: Option<&SortValue>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Asc => a.compare_to(b),
            SortDirection::Desc => b.compare_to(a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn extractor(
    spec: &SortSpec,
    registry: &FieldRegistry,
) -> impl Fn(&Record) -> Option<SortValue> + use<> {
    let registered = registry.get(&spec.key).cloned();
    let adhoc = FieldDef::new(&spec.key, FieldKind::Text);
    move |record| match &registered {
        Some(field) => sort_value(field, record),
        None => infer_value(&adhoc, record),
    }
}

/// Total-order comparator for the active sort.
///
/// Numbers compare numerically, timestamps chronologically, everything else
/// byte-wise on the raw text.
pub fn comparator(
    spec: &SortSpec,
    registry: &FieldRegistry,
) -> impl Fn(&Record, &Record) -> Ordering + use<> {
    let key = extractor(spec, registry);
    let direction = spec.direction;
    move |a, b| compare(key(a).as_ref(), key(b).as_ref(), direction)
}

/// Stable sort: rows with equal keys keep their incoming relative order,
/// whichever direction is requested.
///
/// Keys are extracted once per row rather than once per comparison.
pub fn sort_records<'a>(
    rows: Vec<&'a Record>,
    spec: &SortSpec,
    registry: &FieldRegistry,
) -> Vec<&'a Record> {
    let key = extractor(spec, registry);
    let mut keyed: Vec<(Option<SortValue>, &'a Record)> =
        rows.into_iter().map(|r| (key(r), r)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare(a.as_ref(), b.as_ref(), spec.direction));
    keyed.into_iter().map(|(_, r)| r).collect()
}
