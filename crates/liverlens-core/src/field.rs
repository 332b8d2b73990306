use std::borrow::Cow;
use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::record::{Record, Scalar, parse_timestamp};

/// Field keys used by the prediction history view.
pub mod history {
    pub const ID: &str = "id";
    pub const PATIENT_ID: &str = "input_data.Patient_ID";
    pub const PATIENT_NAME: &str = "input_data.Patient_Name";
    pub const PREDICTION: &str = "prediction";
    pub const RISK_LEVEL: &str = "risk_level";
    pub const TIMESTAMP: &str = "timestamp";
    pub const AGE: &str = "input_data.Age";
    pub const SEX: &str = "input_data.Sex";
    pub const BILIRUBIN: &str = "input_data.Bilirubin";
    pub const ALBUMIN: &str = "input_data.Albumin";
    pub const DRUG: &str = "input_data.Drug";
    pub const STAGE: &str = "input_data.Stage";
}

/// Field keys used by the anonymized dataset explorer.
pub mod dataset {
    pub const RECORD_ID: &str = "record_id";
    pub const N_DAYS: &str = "n_days";
    pub const DRUG: &str = "drug";
    pub const AGE: &str = "age";
    pub const SEX: &str = "sex";
    pub const ASCITES: &str = "ascites";
    pub const HEPATOMEGALY: &str = "hepatomegaly";
    pub const SPIDERS: &str = "spiders";
    pub const EDEMA: &str = "edema";
    pub const BILIRUBIN: &str = "bilirubin";
    pub const CHOLESTEROL: &str = "cholesterol";
    pub const ALBUMIN: &str = "albumin";
    pub const COPPER: &str = "copper";
    pub const ALK_PHOS: &str = "alk_phos";
    pub const SGOT: &str = "sgot";
    pub const TRYGLICERIDES: &str = "tryglicerides";
    pub const PLATELETS: &str = "platelets";
    pub const PROTHROMBIN: &str = "prothrombin";
    pub const STAGE: &str = "stage";
    pub const RISK_LEVEL: &str = "risk_level";
    pub const TIMESTAMP: &str = "timestamp";
}

/// How a field's values are interpreted for filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Categorical,
    /// Boolean stored as `"Y"`/`"N"`.
    Flag,
    Text,
    Timestamp,
}

/// Where a field lives inside a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLocation {
    /// The record identifier (`_id` / `record_id`).
    Id,
    Top(String),
    /// Nested under `input_data`.
    Input(String),
}

impl FieldLocation {
    /// Resolve a field key: `input_data.X` is nested, the identifier aliases
    /// map to [`FieldLocation::Id`], anything else is top-level.
    pub fn parse(key: &str) -> Self {
        match key {
            "id" | "_id" | "record_id" => Self::Id,
            _ => match key.strip_prefix("input_data.") {
                Some(name) => Self::Input(name.to_string()),
                None => Self::Top(key.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub key: String,
    pub kind: FieldKind,
    pub location: FieldLocation,
}

impl FieldDef {
    pub fn new(key: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            kind,
            location: FieldLocation::parse(key),
        }
    }

    /// Raw scalar for this field, `None` when absent or empty.
    pub fn scalar<'a>(&self, record: &'a Record) -> Option<Scalar<'a>> {
        match &self.location {
            FieldLocation::Id => Some(Scalar::Text(&record.id)),
            FieldLocation::Top(name) => record.field(name),
            FieldLocation::Input(name) => record.input(name),
        }
    }

    /// Numeric value. Numeric strings are accepted; anything else is absent.
    pub fn number(&self, record: &Record) -> Option<f64> {
        match self.scalar(record)? {
            Scalar::Number(n) => Some(n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Scalar::Bool(_) => None,
        }
    }

    /// Textual value. Flags render booleans as `Y`/`N`.
    pub fn text<'a>(&self, record: &'a Record) -> Option<Cow<'a, str>> {
        match self.scalar(record)? {
            Scalar::Text(s) => Some(Cow::Borrowed(s)),
            Scalar::Number(n) => Some(Cow::Owned(n.to_string())),
            Scalar::Bool(b) if self.kind == FieldKind::Flag => {
                Some(Cow::Borrowed(if b { "Y" } else { "N" }))
            }
            Scalar::Bool(b) => Some(Cow::Owned(b.to_string())),
        }
    }

    pub fn timestamp(&self, record: &Record) -> Option<Timestamp> {
        match self.scalar(record)? {
            Scalar::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }
}

/// Which fields are numeric, categorical, textual or dated.
///
/// Criteria and sort keys that name a field outside the registry still work:
/// [`FieldRegistry::resolve`] falls back to an ad-hoc definition.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: BTreeMap<String, FieldDef>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, kind: FieldKind) -> Self {
        self.fields.insert(key.to_string(), FieldDef::new(key, kind));
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldDef> {
        self.fields.get(key)
    }

    pub fn require(&self, key: &str) -> Result<&FieldDef, CoreError> {
        self.get(key)
            .ok_or_else(|| CoreError::UnknownField(key.to_string()))
    }

    /// Registered definition, or an ad-hoc one of kind `fallback`.
    pub fn resolve(&self, key: &str, fallback: FieldKind) -> FieldDef {
        self.get(key)
            .cloned()
            .unwrap_or_else(|| FieldDef::new(key, fallback))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values()
    }

    /// Registry for the prediction history page.
    pub fn history() -> Self {
        Self::new()
            .with(history::ID, FieldKind::Text)
            .with(history::PATIENT_ID, FieldKind::Text)
            .with(history::PATIENT_NAME, FieldKind::Text)
            .with(history::PREDICTION, FieldKind::Categorical)
            .with(history::RISK_LEVEL, FieldKind::Categorical)
            .with(history::TIMESTAMP, FieldKind::Timestamp)
            .with(history::AGE, FieldKind::Numeric)
            .with(history::SEX, FieldKind::Categorical)
            .with(history::BILIRUBIN, FieldKind::Numeric)
            .with(history::ALBUMIN, FieldKind::Numeric)
            .with(history::DRUG, FieldKind::Categorical)
            .with(history::STAGE, FieldKind::Numeric)
    }

    /// Registry for the dataset explorer.
    pub fn dataset() -> Self {
        [
            (dataset::RECORD_ID, FieldKind::Text),
            (dataset::N_DAYS, FieldKind::Numeric),
            (dataset::DRUG, FieldKind::Categorical),
            (dataset::AGE, FieldKind::Numeric),
            (dataset::SEX, FieldKind::Categorical),
            (dataset::ASCITES, FieldKind::Flag),
            (dataset::HEPATOMEGALY, FieldKind::Flag),
            (dataset::SPIDERS, FieldKind::Flag),
            (dataset::EDEMA, FieldKind::Categorical),
            (dataset::BILIRUBIN, FieldKind::Numeric),
            (dataset::CHOLESTEROL, FieldKind::Numeric),
            (dataset::ALBUMIN, FieldKind::Numeric),
            (dataset::COPPER, FieldKind::Numeric),
            (dataset::ALK_PHOS, FieldKind::Numeric),
            (dataset::SGOT, FieldKind::Numeric),
            (dataset::TRYGLICERIDES, FieldKind::Numeric),
            (dataset::PLATELETS, FieldKind::Numeric),
            (dataset::PROTHROMBIN, FieldKind::Numeric),
            (dataset::STAGE, FieldKind::Numeric),
            (dataset::RISK_LEVEL, FieldKind::Categorical),
            (dataset::TIMESTAMP, FieldKind::Timestamp),
        ]
        .into_iter()
        .fold(Self::new(), |reg, (key, kind)| reg.with(key, kind))
    }
}
