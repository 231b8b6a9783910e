//! Error types for the market data client.

use serde::Deserialize;
use thiserror::Error;

/// The main error type for all market data operations.
///
/// Every variant renders a human-readable message that can be shown to an end user
/// as-is. The type is `Clone` so that a single upstream result can be handed to every
/// caller waiting on the same in-flight request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    /// The upstream API reported that the request rate was exceeded.
    #[error("{}", throttled_message(.retry_after_ms))]
    Throttled {
        /// Suggested wait time in milliseconds, taken from `Retry-After` when present.
        retry_after_ms: Option<u64>,
    },

    /// The upstream response was missing required fields or had the wrong shape.
    #[error("Invalid response: {0}")]
    Validation(String),

    /// The requested coin identifier does not exist upstream.
    #[error("Cryptocurrency with ID \"{id}\" not found")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// The upstream API answered with a non-success status.
    #[error("Upstream API error: {0}")]
    Api(ApiError),

    /// The HTTP request could not be completed (connection, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// The caller supplied an argument that cannot be used.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local persistent state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),
}

fn throttled_message(retry_after_ms: &Option<u64>) -> String {
    match retry_after_ms {
        Some(ms) => format!(
            "Too many requests, please retry after {} s",
            ms.div_ceil(1000)
        ),
        None => "Too many requests, please try again later".to_string(),
    }
}

/// Coarse classification of a [`MarketError`].
///
/// Callers that only care about how to react (retry later, report a bad id, show a
/// generic failure) can match on this instead of the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Upstream rate limiting.
    Throttled,
    /// Malformed upstream data or unusable caller input.
    Validation,
    /// Unknown coin identifier.
    NotFound,
    /// Network failure, any other non-success status, or a local storage failure.
    Transport,
}

impl MarketError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::Throttled { .. } => ErrorKind::Throttled,
            MarketError::Validation(_) | MarketError::InvalidInput(_) => ErrorKind::Validation,
            MarketError::NotFound { .. } => ErrorKind::NotFound,
            MarketError::Api(_)
            | MarketError::Http(_)
            | MarketError::Url(_)
            | MarketError::Storage(_) => ErrorKind::Transport,
        }
    }

    /// Check if this is an upstream throttling error.
    pub fn is_throttled(&self) -> bool {
        matches!(self, MarketError::Throttled { .. })
    }

    /// The HTTP status reported upstream, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            MarketError::Throttled { .. } => Some(429),
            MarketError::Api(api) => Some(api.status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for MarketError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MarketError::Validation(err.to_string())
        } else {
            MarketError::Http(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for MarketError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(inner) => inner.into(),
            other => MarketError::Http(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        MarketError::Validation(format!("Invalid response format from API: {}", err))
    }
}

/// A non-success response from the upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Message extracted from the response body, if the API provided one.
    pub message: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "HTTP {}: {}", self.status, message),
            None => write!(
                f,
                "HTTP {}: request failed, please try again later",
                self.status
            ),
        }
    }
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// Build an API error from a status and the raw response body.
    ///
    /// The upstream uses two body shapes for errors: `{"error": "..."}` and
    /// `{"status": {"error_code": 429, "error_message": "..."}}`. Anything else
    /// leaves the message empty.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message)
            .filter(|m| !m.trim().is_empty());
        Self::new(status, message)
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Check if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<ErrorStatus>,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    error_message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        match self.error {
            Some(serde_json::Value::String(s)) => return Some(s),
            Some(serde_json::Value::Object(map)) => {
                if let Some(serde_json::Value::String(s)) = map.get("message") {
                    return Some(s.clone());
                }
            }
            _ => {}
        }
        self.status.and_then(|s| s.error_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_from_error_field() {
        let error = ApiError::from_body(404, r#"{"error":"coin not found"}"#);
        assert_eq!(error.message.as_deref(), Some("coin not found"));
        assert!(error.is_not_found());
    }

    #[test]
    fn test_api_error_from_status_block() {
        let body = r#"{"status":{"error_code":503,"error_message":"Service busy"}}"#;
        let error = ApiError::from_body(503, body);
        assert_eq!(error.message.as_deref(), Some("Service busy"));
        assert!(error.is_server_error());
    }

    #[test]
    fn test_api_error_fallback_message() {
        let error = ApiError::from_body(502, "<html>bad gateway</html>");
        assert!(error.message.is_none());
        assert_eq!(
            error.to_string(),
            "HTTP 502: request failed, please try again later"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            MarketError::Throttled {
                retry_after_ms: None
            }
            .kind(),
            ErrorKind::Throttled
        );
        assert_eq!(
            MarketError::Validation("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            MarketError::NotFound { id: "x".into() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            MarketError::Api(ApiError::new(500, None)).kind(),
            ErrorKind::Transport
        );
        assert_eq!(MarketError::Http("reset".into()).kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_throttled_message() {
        let err = MarketError::Throttled {
            retry_after_ms: None,
        };
        assert_eq!(err.to_string(), "Too many requests, please try again later");

        let err = MarketError::Throttled {
            retry_after_ms: Some(5000),
        };
        assert_eq!(err.to_string(), "Too many requests, please retry after 5 s");

        let err = MarketError::Throttled {
            retry_after_ms: Some(1500),
        };
        assert_eq!(err.to_string(), "Too many requests, please retry after 2 s");
    }

    #[test]
    fn test_not_found_message() {
        let err = MarketError::NotFound {
            id: "dogecoin2".to_string(),
        };
        assert_eq!(err.to_string(), "Cryptocurrency with ID \"dogecoin2\" not found");
    }
}
