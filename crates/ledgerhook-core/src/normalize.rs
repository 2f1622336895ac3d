//! Per-source payload normalization into canonical transactions.
//!
//! Each supported source maps to a pure normalization function taking the
//! validated envelope and the current time, returning a complete
//! `NewTransaction` or a `NormalizeError`. Normalization either fully
//! succeeds or the event is rejected before any persistence; partial
//! records are impossible by construction.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{NewTransaction, Source, TransactionKind};

/// Validated inbound webhook envelope.
///
/// Built by the API layer after field-presence validation and source
/// parsing. Transient: exists only for the duration of one request.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Originating system, already parsed into the closed set.
    pub source: Source,
    /// Internal user/account identifier from the wire `userId` field.
    pub user_id: String,
    /// Source-specific payload object.
    pub data: Value,
}

/// Validation failure while normalizing a source payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The payload field that should carry the amount is missing or not
    /// a finite number (numeric strings are accepted).
    #[error("{source} payload has no numeric {field}")]
    InvalidAmount {
        /// Source whose payload was malformed. Declared as a raw
        /// identifier so thiserror does not infer it as `Error::source`.
        r#source: Source,
        /// Payload field expected to carry the amount.
        field: &'static str,
    },

    /// The payload's transaction type is outside {income, expense}.
    #[error("unrecognized transaction type: {0}")]
    InvalidKind(String),

    /// The payload carries a date that cannot be interpreted.
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

/// Normalizes a webhook envelope into a canonical transaction.
///
/// Dispatches on the closed `Source` enum; `now` is injected so date
/// defaulting is deterministic under test.
pub fn normalize(
    envelope: &Envelope,
    now: DateTime<Utc>,
) -> Result<NewTransaction, NormalizeError> {
    match envelope.source {
        Source::Stripe => normalize_stripe(envelope, now),
        Source::Hubspot | Source::Salesforce => normalize_deal(envelope, now),
        Source::Zapier => normalize_zapier(envelope, now),
    }
}

/// Stripe invoice events.
///
/// `amount_paid` arrives in minor units and is divided by 100. `created`
/// is epoch seconds; when absent the event dates to ingestion time.
fn normalize_stripe(
    envelope: &Envelope,
    now: DateTime<Utc>,
) -> Result<NewTransaction, NormalizeError> {
    let data = &envelope.data;

    let minor_units = numeric_field(data.get("amount_paid")).ok_or(
        NormalizeError::InvalidAmount { source: Source::Stripe, field: "amount_paid" },
    )?;
    let amount = minor_units / 100.0;

    let email = data.get("customer_email").and_then(Value::as_str).unwrap_or("unknown");
    let description = format!("Stripe Invoice: {email}");

    let date = match data.get("created") {
        None | Some(Value::Null) => now,
        Some(value) => {
            let secs = value
                .as_i64()
                .ok_or_else(|| NormalizeError::InvalidDate(format!("created: {value}")))?;
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| NormalizeError::InvalidDate(format!("created: {secs}")))?
        },
    };

    finish(envelope, amount, TransactionKind::Income, description, date)
}

/// HubSpot and Salesforce deal events share one payload shape: the deal
/// fields live under `properties` and the amount may arrive as a string.
fn normalize_deal(
    envelope: &Envelope,
    now: DateTime<Utc>,
) -> Result<NewTransaction, NormalizeError> {
    let properties = envelope.data.get("properties");

    let amount = numeric_field(properties.and_then(|p| p.get("amount"))).ok_or(
        NormalizeError::InvalidAmount { source: envelope.source, field: "properties.amount" },
    )?;

    let dealname =
        properties.and_then(|p| p.get("dealname")).and_then(Value::as_str).unwrap_or("unknown");
    let description = format!("Deal Won: {dealname}");

    finish(envelope, amount, TransactionKind::Income, description, now)
}

/// Generic Zapier imports: fields pass through with defaults for
/// everything except the amount.
fn normalize_zapier(
    envelope: &Envelope,
    now: DateTime<Utc>,
) -> Result<NewTransaction, NormalizeError> {
    let data = &envelope.data;

    let amount = numeric_field(data.get("amount"))
        .ok_or(NormalizeError::InvalidAmount { source: Source::Zapier, field: "amount" })?;

    let kind = match data.get("type") {
        None | Some(Value::Null) => TransactionKind::Expense,
        Some(value) => {
            let tag = value
                .as_str()
                .ok_or_else(|| NormalizeError::InvalidKind(value.to_string()))?;
            tag.parse().map_err(|_| NormalizeError::InvalidKind(tag.to_string()))?
        },
    };

    let description = data
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("Zapier Import")
        .to_string();

    let date = match data.get("date") {
        None | Some(Value::Null) => now,
        Some(value) => {
            let raw = value
                .as_str()
                .ok_or_else(|| NormalizeError::InvalidDate(value.to_string()))?;
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| NormalizeError::InvalidDate(raw.to_string()))?
        },
    };

    finish(envelope, amount, kind, description, date)
}

/// Assembles the canonical record, enforcing the finite-amount invariant
/// and deriving the deduplication key last so it covers the final fields.
fn finish(
    envelope: &Envelope,
    amount: f64,
    kind: TransactionKind,
    description: String,
    date: DateTime<Utc>,
) -> Result<NewTransaction, NormalizeError> {
    if !amount.is_finite() {
        return Err(NormalizeError::InvalidAmount {
            source: envelope.source,
            field: "amount",
        });
    }

    let mut tx = NewTransaction {
        user_id: envelope.user_id.clone(),
        amount,
        kind,
        description,
        date,
        source: envelope.source,
        dedup_key: String::new(),
    };
    tx.dedup_key = dedup_key(envelope, &tx);
    Ok(tx)
}

/// Derives the deduplication key for a normalized transaction.
///
/// Vendors that redeliver on timeout usually carry a stable event id; when
/// `data.id` is a string we use it directly. Otherwise the key is a
/// SHA-256 over the normalized fields, so byte-identical redeliveries
/// collapse to one row while distinct events never collide in practice.
fn dedup_key(envelope: &Envelope, tx: &NewTransaction) -> String {
    if let Some(vendor_id) = envelope.data.get("id").and_then(Value::as_str) {
        return format!("{}:{}", tx.source, vendor_id);
    }

    let mut hasher = Sha256::new();
    hasher.update(tx.source.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(tx.user_id.as_bytes());
    hasher.update([0]);
    hasher.update(tx.amount.to_bits().to_be_bytes());
    hasher.update(tx.kind.to_string().as_bytes());
    hasher.update([0]);
    hasher.update(tx.description.as_bytes());
    hasher.update([0]);
    hasher.update(tx.date.to_rfc3339().as_bytes());

    format!("{}:{}", tx.source, hex::encode(hasher.finalize()))
}

/// Reads a numeric payload field, accepting JSON numbers and numeric
/// strings (CRM exports routinely quote amounts). Returns `None` for
/// anything else, including non-finite values.
fn numeric_field(value: Option<&Value>) -> Option<f64> {
    let value = value?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}
