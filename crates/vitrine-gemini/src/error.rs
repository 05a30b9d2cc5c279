//! Setup errors and failure classification.

use vitrine_workflow::GatewayError;

/// Errors constructing a [`GeminiGateway`](crate::GeminiGateway).
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    /// No API key in the configuration or the environment.
    #[error("no API key configured; set GEMINI_API_KEY or API_KEY")]
    MissingApiKey,

    /// Configuration is invalid.
    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Marker the API uses for quota rejections.
const QUOTA_MARKER: &str = "RESOURCE_EXHAUSTED";

/// Longest body excerpt kept in an error detail.
const DETAIL_LIMIT: usize = 512;

/// Classify a non-success HTTP response.
///
/// Status 429, or a body naming the quota condition, is a rate limit;
/// anything else is unknown.
#[must_use]
pub fn classify_status(status: u16, body: &str) -> GatewayError {
    let detail = format!("HTTP {status}: {}", excerpt(body));
    if status == 429 || body.contains(QUOTA_MARKER) {
        GatewayError::rate_limited(detail)
    } else {
        GatewayError::unknown(detail)
    }
}

/// Classify a transport failure.
#[must_use]
pub fn classify_transport(err: &reqwest::Error) -> GatewayError {
    if err.status().is_some_and(|s| s.as_u16() == 429) {
        return GatewayError::rate_limited(err.to_string());
    }
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    GatewayError::unknown(format!("{kind}: {err}"))
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(DETAIL_LIMIT) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use vitrine_workflow::GatewayErrorKind;

    use super::*;

    #[test]
    fn status_429_is_rate_limited() {
        let err = classify_status(429, "{}");
        assert_eq!(err.kind, GatewayErrorKind::RateLimited);
        assert!(err.detail.starts_with("HTTP 429"));
    }

    #[test]
    fn quota_marker_in_body_is_rate_limited() {
        let body = r#"{"error": {"code": 403, "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            classify_status(403, body).kind,
            GatewayErrorKind::RateLimited
        );
    }

    #[test]
    fn other_failures_are_unknown() {
        assert_eq!(
            classify_status(500, "internal").kind,
            GatewayErrorKind::Unknown
        );
        assert_eq!(
            classify_status(400, "INVALID_ARGUMENT").kind,
            GatewayErrorKind::Unknown
        );
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "é".repeat(DETAIL_LIMIT * 2);
        let err = classify_status(500, &body);
        assert_eq!(
            err.detail.chars().count(),
            "HTTP 500: ".len() + DETAIL_LIMIT
        );
    }
}
