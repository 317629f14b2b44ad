//! Transport error types shared by the coordinator and broker clients

use thiserror::Error;

/// Maximum response body size accepted from the coordinator or a broker (16 MB).
pub const MAX_RESPONSE_SIZE: usize = 16 * 1024 * 1024;

/// Errors raised while talking to the coordinator or a broker.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {status} for {url}")]
    Http { status: reqwest::StatusCode, url: String },

    /// The broker answered 403: the subscriber is unknown to it
    #[error("Forbidden: {url}")]
    Forbidden { url: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Empty response body from {0}")]
    EmptyBody(String),

    #[error("Response too large ({size} bytes, max {MAX_RESPONSE_SIZE})")]
    ResponseTooLarge { size: u64 },
}

impl TransportError {
    /// Whether the broker refused the request for an unregistered subscriber.
    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }
}

/// Read a response body with size limit and deserialize as JSON.
///
/// Returns `Ok(None)` for an empty body.
pub async fn json_with_limit<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<Option<T>, TransportError> {
    if let Some(cl) = response.content_length() {
        if cl as usize > MAX_RESPONSE_SIZE {
            return Err(TransportError::ResponseTooLarge { size: cl });
        }
    }
    let bytes = response.bytes().await?;
    if bytes.len() > MAX_RESPONSE_SIZE {
        return Err(TransportError::ResponseTooLarge { size: bytes.len() as u64 });
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(&bytes).map(Some).map_err(Into::into)
}

/// Check HTTP response status before processing body.
pub fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = resp.status();
    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(TransportError::Forbidden {
            url: resp.url().to_string(),
        });
    }
    if !status.is_success() {
        return Err(TransportError::Http {
            status,
            url: resp.url().to_string(),
        });
    }
    Ok(resp)
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
