use serde::{Deserialize, Serialize};

use crate::field::dataset;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Wire form, as sent in `sort_direction`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// The single active sort key and its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: &str, direction: SortDirection) -> Self {
        Self {
            key: key.to_string(),
            direction,
        }
    }

    pub fn asc(key: &str) -> Self {
        Self::new(key, SortDirection::Asc)
    }

    pub fn desc(key: &str) -> Self {
        Self::new(key, SortDirection::Desc)
    }

    /// Header-click semantics: the same key flips direction, a new key
    /// starts ascending.
    pub fn toggled(&self, key: &str) -> Self {
        if self.key == key {
            Self::new(key, self.direction.reversed())
        } else {
            Self::asc(key)
        }
    }
}

impl Default for SortSpec {
    /// Newest first.
    fn default() -> Self {
        Self::desc(dataset::TIMESTAMP)
    }
}
