use jiff::Timestamp;
use jiff::civil;
use jiff::tz::TimeZone;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A stored prediction record, as returned by the Record Store Service.
///
/// The history endpoint keys records by `_id` and nests the clinical inputs
/// (plus patient identifiers) under `input_data`; the explore endpoint returns
/// flat rows keyed by `record_id`. Both shapes deserialize into this type.
/// Everything that is not the identifier or `input_data` lands in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(alias = "_id", alias = "record_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub input_data: Map<String, Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A borrowed scalar view of a JSON field value.
///
/// Nulls, empty strings, arrays and objects have no scalar view; to the
/// engine they are the same as an absent field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Text(&'a str),
    Number(f64),
    Bool(bool),
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            input_data: Map::new(),
            fields: Map::new(),
        }
    }

    /// Set a top-level field. Builder-style, mostly for fixtures.
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Set a nested `input_data` field.
    pub fn with_input(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.input_data.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<Scalar<'_>> {
        self.fields.get(name).and_then(scalar)
    }

    pub fn input(&self, name: &str) -> Option<Scalar<'_>> {
        self.input_data.get(name).and_then(scalar)
    }

    /// The record's `timestamp` field, if present and parseable.
    pub fn timestamp(&self) -> Option<Timestamp> {
        match self.field("timestamp")? {
            Scalar::Text(raw) => parse_timestamp(raw),
            _ => None,
        }
    }
}

fn scalar(value: &Value) -> Option<Scalar<'_>> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(Scalar::Text(s)),
        Value::Number(n) => n.as_f64().map(Scalar::Number),
        Value::Bool(b) => Some(Scalar::Bool(*b)),
        _ => None,
    }
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 instants, naive ISO datetimes (the backend writes
/// `datetime.utcnow().isoformat()`, so these are UTC), and bare dates
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Some(ts);
    }
    if let Ok(dt) = raw.parse::<civil::DateTime>() {
        return dt.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp());
    }
    raw.parse::<civil::Date>()
        .ok()
        .and_then(|d| d.to_zoned(TimeZone::UTC).ok())
        .map(|z| z.timestamp())
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
