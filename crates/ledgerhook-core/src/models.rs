//! Canonical transaction model and strongly-typed identifiers.
//!
//! The closed `Source` and `TransactionKind` enums replace the original
//! string-tag dispatch so the supported set is statically enumerable and
//! the two-value type invariant holds by construction.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Strongly-typed transaction identifier.
///
/// Wraps a UUID to prevent mixing with other ID types. Assigned once at
/// insert time; rows are never mutated by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    /// Creates a new random transaction ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TransactionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Direction of a canonical transaction.
///
/// Persisted as the `type` column. Every row must carry one of these two
/// values; there is no third state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money in (invoices paid, deals won).
    Income,
    /// Money out. Default for generic imports that omit a type.
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "income"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

/// Error returned when a transaction kind tag is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized transaction type: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for TransactionKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("income") {
            Ok(Self::Income)
        } else if s.eq_ignore_ascii_case("expense") {
            Ok(Self::Expense)
        } else {
            Err(UnknownKind(s.to_string()))
        }
    }
}

/// Originating third-party system of a webhook event.
///
/// Closed set; the tag is matched case-insensitively on the wire and
/// anything outside it is rejected before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Stripe invoice events (amounts arrive in minor units).
    Stripe,
    /// HubSpot deal events.
    Hubspot,
    /// Salesforce deal events (same payload shape as HubSpot).
    Salesforce,
    /// Generic Zapier imports with pass-through fields.
    Zapier,
}

impl Source {
    /// Canonical lowercase tag, as persisted in the `source` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Hubspot => "hubspot",
            Self::Salesforce => "salesforce",
            Self::Zapier => "zapier",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a source tag is outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported source: {0}")]
pub struct UnknownSource(pub String);

impl FromStr for Source {
    type Err = UnknownSource;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("stripe") {
            Ok(Self::Stripe)
        } else if s.eq_ignore_ascii_case("hubspot") {
            Ok(Self::Hubspot)
        } else if s.eq_ignore_ascii_case("salesforce") {
            Ok(Self::Salesforce)
        } else if s.eq_ignore_ascii_case("zapier") {
            Ok(Self::Zapier)
        } else {
            Err(UnknownSource(s.to_string()))
        }
    }
}

/// Canonical transaction record ready for persistence.
///
/// The fully-normalized projection of an inbound webhook envelope. The
/// envelope itself is never stored; only this projection persists, and
/// only as a complete record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Internal user/account the event belongs to. Opaque, not validated
    /// against an existing user.
    pub user_id: String,

    /// Amount in major units. Always finite; Stripe minor units are
    /// divided by 100 during normalization.
    pub amount: f64,

    /// Income or expense, fixed per source branch or taken from the
    /// payload for generic imports.
    pub kind: TransactionKind,

    /// Human-readable description, synthesized per source.
    pub description: String,

    /// When the underlying event occurred. Source-derived, or the
    /// ingestion clock's now when the payload carries no timestamp.
    pub date: DateTime<Utc>,

    /// Originating system, kept for operational triage.
    pub source: Source,

    /// Deduplication key: vendor event id when available, otherwise a
    /// content hash of the normalized fields. Unique at the storage layer.
    pub dedup_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_parses_case_insensitively() {
        for tag in ["stripe", "Stripe", "STRIPE"] {
            assert_eq!(tag.parse::<Source>().unwrap(), Source::Stripe);
        }
        assert_eq!("HubSpot".parse::<Source>().unwrap(), Source::Hubspot);
        assert_eq!("salesforce".parse::<Source>().unwrap(), Source::Salesforce);
        assert_eq!("ZAPIER".parse::<Source>().unwrap(), Source::Zapier);
    }

    #[test]
    fn source_rejects_unknown_vendor() {
        let err = "unknown-vendor".parse::<Source>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported source: unknown-vendor");
    }

    #[test]
    fn kind_display_matches_column_values() {
        assert_eq!(TransactionKind::Income.to_string(), "income");
        assert_eq!(TransactionKind::Expense.to_string(), "expense");
    }

    #[test]
    fn kind_parses_and_rejects() {
        assert_eq!("income".parse::<TransactionKind>().unwrap(), TransactionKind::Income);
        assert_eq!("Expense".parse::<TransactionKind>().unwrap(), TransactionKind::Expense);
        assert!("transfer".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn transaction_id_displays_as_uuid() {
        let id = TransactionId::new();
        assert_eq!(id.to_string(), id.0.to_string());
    }
}
