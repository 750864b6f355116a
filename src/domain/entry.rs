use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, Identity, OrderId};

pub type EntryId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Credit declared by the caller
    Deposit,
    /// Debit taken when an order was placed
    OrderDebit,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Deposit => "deposit",
            EntryKind::OrderDebit => "order_debit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(EntryKind::Deposit),
            "order_debit" => Some(EntryKind::OrderDebit),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only audit record of a balance change. Entries are immutable;
/// the account balance is the materialized sum of its entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub identity: Identity,
    pub kind: EntryKind,
    /// Amount moved, in cents (always positive; the kind gives direction)
    pub amount_cents: Cents,
    /// For order debits, the order that caused the entry
    pub order_id: Option<OrderId>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn deposit(identity: Identity, amount_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            kind: EntryKind::Deposit,
            amount_cents,
            order_id: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn order_debit(identity: Identity, amount_cents: Cents, order_id: OrderId) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            kind: EntryKind::OrderDebit,
            amount_cents,
            order_id: Some(order_id),
            recorded_at: Utc::now(),
        }
    }
}
