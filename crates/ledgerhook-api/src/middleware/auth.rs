//! Shared-secret authentication for the ingest endpoint.
//!
//! Webhook senders present a static secret in the `x-webhook-secret`
//! header. The comparison is constant-time and runs before the body is
//! touched; on mismatch the request fails closed with a 401 and only an
//! audit line is logged, never the payload.

use axum::{extract::State, middleware::Next, response::Response};
use tracing::warn;

use crate::{error::IngestError, server::AppState};

/// Header carrying the shared webhook secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Configured shared secret, loaded once at startup.
#[derive(Debug, Clone)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Wraps a configured secret value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Constant-time exact match against a presented value.
    pub fn matches(&self, presented: &str) -> bool {
        timing_safe_eq(self.0.as_bytes(), presented.as_bytes())
    }
}

/// Axum middleware enforcing the shared-secret gate on ingest routes.
pub async fn require_webhook_secret(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: Next,
) -> Result<Response, IngestError> {
    let presented = req.headers().get(WEBHOOK_SECRET_HEADER).and_then(|v| v.to_str().ok());

    match presented {
        Some(value) if state.secret.matches(value) => Ok(next.run(req).await),
        Some(_) => {
            warn!("rejected webhook: shared secret mismatch");
            Err(IngestError::Unauthorized)
        },
        None => {
            warn!("rejected webhook: missing {} header", WEBHOOK_SECRET_HEADER);
            Err(IngestError::Unauthorized)
        },
    }
}

/// Timing-safe byte comparison to avoid leaking the secret through
/// response latency.
fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.iter().zip(b.iter()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secret_is_accepted() {
        let secret = SharedSecret::new("hook-secret-123");
        assert!(secret.matches("hook-secret-123"));
    }

    #[test]
    fn prefix_and_suffix_are_rejected() {
        let secret = SharedSecret::new("hook-secret-123");
        assert!(!secret.matches("hook-secret"));
        assert!(!secret.matches("hook-secret-1234"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn timing_safe_eq_requires_exact_bytes() {
        assert!(timing_safe_eq(b"abc", b"abc"));
        assert!(!timing_safe_eq(b"abc", b"abd"));
        assert!(!timing_safe_eq(b"abc", b"abcd"));
    }
}
