use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::header::RETRY_AFTER;

/// First backoff step when the server gives no hint
const INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Upper bound for the computed backoff
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Delay before retrying a rate-limited request.
///
/// `attempt` is the 1-based number of the request that was rejected. A
/// server-provided hint is used verbatim; otherwise the delay starts at one
/// second and doubles per attempt, capped at sixty seconds.
pub fn next_delay(attempt: u32, server_hint: Option<Duration>) -> Duration {
    if let Some(hint) = server_hint {
        return hint;
    }

    let exponent = attempt.saturating_sub(1).min(16);
    INITIAL_DELAY
        .saturating_mul(1 << exponent)
        .min(MAX_DELAY)
}

/// Read a numeric `Retry-After` header, in seconds.
///
/// HTTP-date values and anything else non-numeric are ignored.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok().map(Duration::from_secs)
}
