use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;

use crate::error::StoreError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP handle on the Record Store Service.
///
/// Cheap to clone: the underlying `reqwest::Client` pools connections and
/// carries the session cookie jar.
#[derive(Debug, Clone)]
pub struct StoreClient {
    pub(crate) http: Client,
    base_url: Url,
}

impl StoreClient {
    /// Build a client with a cookie store, so the session cookie set at
    /// login is sent on every request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;
        Self::with_http_client(http, base_url)
    }

    /// Wrap an existing `reqwest::Client` (e.g. one shared with the login flow).
    pub fn with_http_client(http: Client, base_url: &str) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| StoreError::Config(format!("invalid base url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Config(format!("not a base url: {base_url}")));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, escaping each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Config(format!("not a base url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Map a non-success response onto the store error taxonomy.
///
/// `subject` names the record a 404 refers to; without one a 404 is reported
/// as a plain status error.
pub(crate) async fn check_status(
    resp: Response,
    subject: Option<&str>,
) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    match (status, subject) {
        (StatusCode::UNAUTHORIZED, _) => Err(StoreError::Unauthorized),
        (StatusCode::NOT_FOUND, Some(id)) => Err(StoreError::NotFound { id: id.to_string() }),
        _ => {
            let message = error_message(resp).await;
            if status == StatusCode::FORBIDDEN {
                Err(StoreError::Forbidden(message))
            } else {
                Err(StoreError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

/// The `{"error": "..."}` body the service sends, or `HTTP <code>: <reason>`.
async fn error_message(resp: Response) -> String {
    let status = resp.status();
    let fallback = format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown status")
    );
    match resp.json::<ErrorBody>().await {
        Ok(ErrorBody { error: Some(msg) }) if !msg.is_empty() => msg,
        _ => fallback,
    }
}
