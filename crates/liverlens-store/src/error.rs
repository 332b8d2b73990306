use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("session expired, please log in again")]
    Unauthorized,

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("record not found: {id}")]
    NotFound { id: String },

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("client config error: {0}")]
    Config(String),
}

impl StoreError {
    /// Transport failures are worth a retry banner; everything else needs
    /// the operator to change something first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else if e.is_builder() {
            Self::Config(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
