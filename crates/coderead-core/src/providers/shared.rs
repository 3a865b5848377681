//! Provider-agnostic types shared by the streaming client and the runner.

use std::fmt;

use anyhow::{Context, Result};
use futures_util::stream::BoxStream;
use serde_json::Value;

/// Standard User-Agent header for coderead API requests.
pub const USER_AGENT: &str = concat!("coderead/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Config resolution helpers
// ============================================================================

/// Resolves an API key with precedence: config > env.
///
/// # Errors
/// Returns a [`ProviderErrorKind::MissingApiKey`] error when neither source has a key.
pub fn resolve_api_key(
    config_api_key: Option<&str>,
    env_var: &str,
    config_section: &str,
) -> ProviderResult<String> {
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ProviderError::new(
            ProviderErrorKind::MissingApiKey,
            format!(
                "API Key not found. Set {env_var} or api_key in [providers.{config_section}]."
            ),
        )),
    }
}

/// Resolves a base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error if the chosen URL does not parse.
pub fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    provider_name: &str,
) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    Ok(default_url.to_string())
}

fn validate_url(url: &str, provider_name: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {provider_name} base URL: {url}"))?;
    Ok(())
}

/// Categories of provider errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection timeout or request timeout
    Timeout,
    /// Connection dropped or the body stream failed mid-response
    Network,
    /// Failed to parse response (JSON parse error, invalid SSE, etc.)
    Parse,
    /// API-level error returned in the stream, or a response without content
    ApiError,
    /// No API key configured
    MissingApiKey,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::HttpStatus => write!(f, "http_status"),
            ProviderErrorKind::Timeout => write!(f, "timeout"),
            ProviderErrorKind::Network => write!(f, "network"),
            ProviderErrorKind::Parse => write!(f, "parse"),
            ProviderErrorKind::ApiError => write!(f, "api_error"),
            ProviderErrorKind::MissingApiKey => write!(f, "missing_api_key"),
        }
    }
}

/// Structured error from the provider with kind and details.
#[derive(Debug, Clone)]
pub struct ProviderError {
    /// Error category
    pub kind: ProviderErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// HTTP status code, for `HttpStatus` errors
    pub status: Option<u16>,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ProviderError {
    /// Creates a new provider error.
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            details: None,
        }
    }

    /// Creates an HTTP status error, pulling `error.message` out of a JSON body when present.
    pub fn http_status(status: u16, body: &str) -> Self {
        let details = (!body.is_empty()).then(|| body.to_string());
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| {
                json.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .map(|msg| format!("API Error: {status}: {msg}"))
            })
            .unwrap_or_else(|| format!("API Error: {status}"));

        Self {
            kind: ProviderErrorKind::HttpStatus,
            message,
            status: Some(status),
            details,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    /// Creates an API error (from mid-stream error event).
    pub fn api_error(error_type: &str, message: &str) -> Self {
        Self::new(ProviderErrorKind::ApiError, format!("{error_type}: {message}"))
    }

    /// Whether a fresh attempt could plausibly succeed.
    ///
    /// Client errors other than 408/429 and a missing key are permanent.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ProviderErrorKind::HttpStatus => match self.status {
                Some(status) => status == 408 || status == 429 || status >= 500,
                None => true,
            },
            ProviderErrorKind::MissingApiKey => false,
            ProviderErrorKind::Timeout
            | ProviderErrorKind::Network
            | ProviderErrorKind::Parse
            | ProviderErrorKind::ApiError => true,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Maps a transport-level reqwest failure onto a provider error.
pub fn classify_reqwest_error(e: &reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::new(ProviderErrorKind::Network, format!("Connection failed: {e}"))
    } else if e.is_request() {
        ProviderError::new(ProviderErrorKind::Network, format!("Request error: {e}"))
    } else {
        ProviderError::new(ProviderErrorKind::Network, format!("Network error: {e}"))
    }
}

/// Token usage reported at the end of a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Events emitted while streaming a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text fragment to append to the response buffer.
    TextDelta(String),
    /// The provider reported a finish reason; the stream ends after this.
    Finished {
        reason: String,
        usage: Option<Usage>,
    },
}

/// Boxed stream of provider events.
pub type ProviderStream = BoxStream<'static, ProviderResult<StreamEvent>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_extracts_json_message() {
        let err = ProviderError::http_status(
            400,
            r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#,
        );
        assert_eq!(err.kind, ProviderErrorKind::HttpStatus);
        assert_eq!(err.status, Some(400));
        assert_eq!(err.to_string(), "API Error: 400: API key not valid");
        assert!(err.details.is_some());
    }

    #[test]
    fn test_http_status_plain_body() {
        let err = ProviderError::http_status(503, "");
        assert_eq!(err.to_string(), "API Error: 503");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::http_status(500, "").is_retryable());
        assert!(ProviderError::http_status(429, "").is_retryable());
        assert!(!ProviderError::http_status(400, "").is_retryable());
        assert!(!ProviderError::http_status(403, "").is_retryable());
        assert!(ProviderError::timeout("slow").is_retryable());
        assert!(ProviderError::api_error("STOP", "Analysis failed").is_retryable());
        assert!(!ProviderError::new(ProviderErrorKind::MissingApiKey, "none").is_retryable());
    }

    #[test]
    fn test_config_api_key_wins() {
        let key = resolve_api_key(Some("  from-config  "), "CODEREAD_TEST_UNSET_KEY", "gemini");
        assert_eq!(key.unwrap(), "from-config");
    }

    #[test]
    fn test_missing_api_key_error() {
        let err = resolve_api_key(None, "CODEREAD_TEST_DEFINITELY_UNSET", "gemini").unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::MissingApiKey);
        assert!(err.message.starts_with("API Key not found."));
    }

    #[test]
    fn test_base_url_config_and_default() {
        let url = resolve_base_url(
            Some("http://localhost:9999/v1beta/"),
            "CODEREAD_TEST_UNSET_URL",
            "https://default",
            "Gemini",
        )
        .unwrap();
        assert_eq!(url, "http://localhost:9999/v1beta");

        let url =
            resolve_base_url(None, "CODEREAD_TEST_UNSET_URL", "https://default", "Gemini").unwrap();
        assert_eq!(url, "https://default");

        assert!(resolve_base_url(Some("not a url"), "CODEREAD_TEST_UNSET_URL", "x", "Gemini").is_err());
    }
}
