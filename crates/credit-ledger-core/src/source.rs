//! Source attribution for ledger mutations.
//!
//! Every balance change records which collaborator caused it, so the ledger
//! can answer "what was this debit for" without joining external tables.

use serde::{Deserialize, Serialize};

/// The subsystem that originated a ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A metered generation request (image, video, etc.).
    Generation,

    /// A one-time credit purchase fulfillment.
    Purchase,

    /// A subscription lifecycle event (grant, renewal reset, revoke).
    Subscription,

    /// A refund issued for failed or cancelled work.
    Refund,

    /// Manual adjustment by an operator.
    Admin,

    /// Custom source.
    Custom(String),
}

impl SourceKind {
    /// Get the source name as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Generation => "generation",
            Self::Purchase => "purchase",
            Self::Subscription => "subscription",
            Self::Refund => "refund",
            Self::Admin => "admin",
            Self::Custom(name) => name,
        }
    }
}

/// A reference to the external record that caused a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Which subsystem originated the mutation.
    pub kind: SourceKind,

    /// Identifier of the originating record (job ID, checkout session,
    /// subscription ID), if any.
    pub id: Option<String>,
}

impl SourceRef {
    /// Create a source reference with an originating record ID.
    #[must_use]
    pub fn new(kind: SourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    /// Create a source reference without an originating record.
    #[must_use]
    pub const fn bare(kind: SourceKind) -> Self {
        Self { kind, id: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_as_str() {
        assert_eq!(SourceKind::Generation.as_str(), "generation");
        assert_eq!(SourceKind::Subscription.as_str(), "subscription");
        assert_eq!(SourceKind::Custom("sweeper".into()).as_str(), "sweeper");
    }

    #[test]
    fn source_ref_constructors() {
        let with_id = SourceRef::new(SourceKind::Purchase, "cs_123");
        assert_eq!(with_id.id.as_deref(), Some("cs_123"));

        let bare = SourceRef::bare(SourceKind::Admin);
        assert!(bare.id.is_none());
    }
}
