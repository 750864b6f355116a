use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, Identity, ServiceId};

pub type OrderId = i64;

/// Lifecycle of an order: pending -> completed | failed.
/// Both targets are terminal; nothing transitions out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "completed" => Some(OrderStatus::Completed),
            "failed" => Some(OrderStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Failed)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Failed)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A placed order. Cost is computed at placement time and frozen -
/// later price changes never touch existing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOrder {
    /// Monotonically assigned, strictly increasing in creation order
    pub id: OrderId,
    pub user: Identity,
    pub service_id: ServiceId,
    pub link: String,
    pub quantity: i64,
    pub cost_cents: Cents,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Completed,
            OrderStatus::Failed,
        ] {
            let s = status.as_str();
            assert_eq!(OrderStatus::from_str(s), Some(status));
        }
    }

    #[test]
    fn test_pending_transitions_to_both_terminals() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Failed));
    }

    #[test]
    fn test_terminal_states_absorb() {
        for terminal in [OrderStatus::Completed, OrderStatus::Failed] {
            assert!(terminal.is_terminal());
            for next in [
                OrderStatus::Pending,
                OrderStatus::Completed,
                OrderStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_pending_is_not_terminal() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }
}
