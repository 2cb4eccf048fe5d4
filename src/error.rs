//! Failure taxonomy shared by every adapter.
//!
//! Adapters never hand raw reqwest/io/serde errors to their callers.  Everything is folded into
//! one of four kinds so the dispatcher can word user-facing messages consistently.

use reqwest::StatusCode;

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// Invalid ID/URL, or the upstream returned zero matching items.
    #[error("not found: {0}")]
    NotFound(String),
    /// Upstream rate limiting or an exhausted API quota.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    /// Network or tool failure, or content that is private/unavailable.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    /// Input rejected before any network call was made.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl AdapterError {
    /// Classify a non-success HTTP response.  `reason` is the structured error reason the
    /// upstream put in its JSON body, if any (e.g. Google's `errors[0].reason`).
    pub fn from_status(status: StatusCode, reason: Option<&str>, body: &str) -> Self {
        let detail = match reason {
            Some(reason) => format!("{} ({})", status, reason),
            None => format!("{} {}", status, body.trim()),
        };

        if let Some(reason) = reason {
            match reason {
                "quotaExceeded" | "rateLimitExceeded" | "userRateLimitExceeded"
                | "dailyLimitExceeded" => return AdapterError::QuotaExceeded(detail),
                // The ID passed our own checks, so the upstream simply doesn't know it.
                "videoNotFound" | "channelNotFound" | "notFound" | "invalidVideoId"
                | "invalidChannelId" => return AdapterError::NotFound(detail),
                // Bad API key, bad request shape: our fault or theirs, never the user's.
                "badRequest" | "invalid" | "keyInvalid" | "forbidden" | "private" => {
                    return AdapterError::UpstreamUnavailable(detail)
                }
                _ => {}
            }
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => AdapterError::QuotaExceeded(detail),
            StatusCode::NOT_FOUND => AdapterError::NotFound(detail),
            _ => Self::from_message(&detail),
        }
    }

    /// Last resort: sniff an error message for well-known markers.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let detail = message.to_owned();

        if lower.contains("429") || lower.contains("quota") || lower.contains("rate limit") {
            AdapterError::QuotaExceeded(detail)
        } else if lower.contains("not found") || lower.contains("404") {
            AdapterError::NotFound(detail)
        } else {
            // "This video is unavailable", "Private video", bad API keys, timeouts, ...
            AdapterError::UpstreamUnavailable(detail)
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return AdapterError::from_status(status, None, &e.to_string());
        }
        if e.is_decode() {
            return AdapterError::UpstreamUnavailable(format!("unexpected response: {}", e));
        }
        AdapterError::from_message(&e.to_string())
    }
}
