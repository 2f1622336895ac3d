//! Request error taxonomy and HTTP status mapping.
//!
//! Every failure path in the ingest flow maps to one of these variants.
//! Caller faults (missing fields, unsupported sources, malformed
//! payloads) respond 400, authentication failures 401, and downstream
//! store failures 502 so senders can distinguish their bugs from ours.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledgerhook_core::{CoreError, NormalizeError};
use serde::Serialize;
use thiserror::Error;

/// Terminal error for a single ingest request.
///
/// All variants are handled locally; nothing is retried or queued. The
/// sender is expected to apply its own retry policy, which the dedup key
/// makes safe.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Missing or mismatched shared secret. The body is never parsed
    /// when this fires.
    #[error("Unauthorized")]
    Unauthorized,

    /// A required envelope field is absent or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The source tag is outside the supported set.
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),

    /// The body is not valid JSON or the payload fails normalization.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The downstream transactions store rejected the write.
    #[error("transaction store error: {0}")]
    Store(#[from] CoreError),
}

impl From<NormalizeError> for IngestError {
    fn from(err: NormalizeError) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

impl IngestError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MissingField(_) | Self::UnsupportedSource(_) | Self::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            },
            Self::Store(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Error response body: `{ "error": "<message>" }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error description.
    pub error: String,
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
