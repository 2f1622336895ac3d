//! Webhook ingestion handler with validation and persistence.
//!
//! Accepts vendor webhook envelopes, validates the required fields,
//! normalizes the vendor payload into a canonical transaction, and
//! persists it with duplicate suppression.

use axum::{extract::State, response::Json};
use bytes::Bytes;
use ledgerhook_core::{normalize, Envelope, NewTransaction, Source};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{error::IngestError, server::AppState, store::InsertOutcome};

/// Incoming webhook envelope before any validation.
///
/// Every field is optional at this stage so that each absence can be
/// reported with a precise error message instead of a generic
/// deserialization failure.
#[derive(Debug, Deserialize)]
pub struct RawEnvelope {
    /// Vendor tag, matched case-insensitively.
    pub source: Option<String>,
    /// Account the transaction belongs to.
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    /// Vendor-specific payload object.
    pub data: Option<Value>,
}

/// Response from successful webhook ingestion.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Always `true`; failures return the error body instead.
    pub success: bool,
    /// Identifier of the canonical transaction, new or pre-existing.
    pub id: String,
}

/// Ingests one vendor webhook as a canonical transaction.
///
/// The shared-secret gate runs before this handler; by the time the
/// body is parsed the caller is authenticated.
///
/// # Errors
///
/// - 400: malformed JSON, missing envelope fields, unsupported source,
///   or a payload the normalizer rejects
/// - 502: the transaction store rejected the write
#[instrument(name = "ingest_webhook", skip(state, body), fields(content_length = body.len()))]
pub async fn ingest_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestResponse>, IngestError> {
    let raw: RawEnvelope = serde_json::from_slice(&body)
        .map_err(|e| IngestError::InvalidPayload(format!("malformed JSON body: {e}")))?;

    let envelope = validate_envelope(raw)?;
    debug!(source = %envelope.source, user_id = %envelope.user_id, "Envelope validated");

    let tx: NewTransaction = normalize(&envelope, state.clock.now_utc())?;

    let outcome = state.store.insert(tx).await?;
    let id = outcome.id();

    match outcome {
        InsertOutcome::Inserted(_) => {
            info!(transaction_id = %id, "Transaction persisted");
        },
        InsertOutcome::Duplicate(_) => {
            info!(transaction_id = %id, "Duplicate webhook suppressed");
        },
    }

    Ok(Json(IngestResponse { success: true, id: id.to_string() }))
}

/// Checks envelope completeness and resolves the source tag.
fn validate_envelope(raw: RawEnvelope) -> Result<Envelope, IngestError> {
    let source_tag = match raw.source {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Err(IngestError::MissingField("source")),
    };

    let user_id = match raw.user_id {
        Some(u) if !u.trim().is_empty() => u,
        _ => return Err(IngestError::MissingField("userId")),
    };

    let data = match raw.data {
        Some(Value::Object(map)) => Value::Object(map),
        Some(_) => {
            return Err(IngestError::InvalidPayload("data must be a JSON object".to_string()))
        },
        None => return Err(IngestError::MissingField("data")),
    };

    let source: Source = source_tag.parse().map_err(|_| {
        warn!(source = %source_tag, "Rejected webhook from unsupported source");
        IngestError::UnsupportedSource(source_tag.clone())
    })?;

    Ok(Envelope { source, user_id, data })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(source: Option<&str>, user_id: Option<&str>, data: Option<Value>) -> RawEnvelope {
        RawEnvelope {
            source: source.map(String::from),
            user_id: user_id.map(String::from),
            data,
        }
    }

    #[test]
    fn complete_envelope_passes_validation() {
        let envelope = validate_envelope(raw(Some("stripe"), Some("user-1"), Some(json!({}))))
            .expect("complete envelope should validate");

        assert_eq!(envelope.source, Source::Stripe);
        assert_eq!(envelope.user_id, "user-1");
    }

    #[test]
    fn source_tag_is_case_insensitive() {
        let envelope = validate_envelope(raw(Some("STRIPE"), Some("user-1"), Some(json!({}))))
            .expect("uppercase tag should validate");

        assert_eq!(envelope.source, Source::Stripe);
    }

    #[test]
    fn missing_fields_are_named() {
        let err = validate_envelope(raw(None, Some("u"), Some(json!({}))))
            .expect_err("missing source");
        assert!(matches!(err, IngestError::MissingField("source")));

        let err =
            validate_envelope(raw(Some("stripe"), None, Some(json!({})))).expect_err("missing user");
        assert!(matches!(err, IngestError::MissingField("userId")));

        let err = validate_envelope(raw(Some("stripe"), Some("u"), None)).expect_err("missing data");
        assert!(matches!(err, IngestError::MissingField("data")));
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let err = validate_envelope(raw(Some("  "), Some("u"), Some(json!({}))))
            .expect_err("blank source");
        assert!(matches!(err, IngestError::MissingField("source")));

        let err = validate_envelope(raw(Some("stripe"), Some(""), Some(json!({}))))
            .expect_err("blank user");
        assert!(matches!(err, IngestError::MissingField("userId")));
    }

    #[test]
    fn non_object_data_is_rejected() {
        let err = validate_envelope(raw(Some("stripe"), Some("u"), Some(json!([1, 2]))))
            .expect_err("array data");
        assert!(matches!(err, IngestError::InvalidPayload(_)));
    }

    #[test]
    fn unknown_source_is_rejected() {
        let err = validate_envelope(raw(Some("paypal"), Some("u"), Some(json!({}))))
            .expect_err("unsupported source");
        assert!(matches!(err, IngestError::UnsupportedSource(tag) if tag == "paypal"));
    }
}
