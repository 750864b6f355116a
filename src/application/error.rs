use thiserror::Error;

use crate::domain::{Cents, OrderStatus, ServiceId};

/// Error taxonomy of the panel core. Validation failures are detected
/// before any mutation; `Database` is the generic internal-fault kind,
/// distinct from the named ones.
///
/// The "Insufficient" and "Quantity" wordings are load-bearing: the
/// browser client selects user messaging by matching those substrings.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: balance {balance}, required {required}")]
    InsufficientBalance { balance: Cents, required: Cents },

    #[error("Quantity must be between {min} and {max}, got {got}")]
    QuantityOutOfRange { min: i64, max: i64, got: i64 },

    #[error("Invalid link: link must not be empty")]
    InvalidLink,

    #[error("Service not found: {0}")]
    ServiceNotFound(ServiceId),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
