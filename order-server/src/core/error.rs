//! Unified error taxonomy for the order backend.
//!
//! Every failure is reported to the caller as a typed variant; nothing
//! is silently swallowed except notifier failures (logged at the call
//! site) and per-order failures inside a sweep batch (logged, batch
//! continues).

use crate::store::StoreError;
use thiserror::Error;

/// Application-level error type
#[derive(Debug, Error)]
pub enum OrderError {
    // ========== Lookup Errors ==========
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Address book entry not found")]
    AddressNotFound,

    // ========== State Machine Errors ==========
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Order can no longer be cancelled")]
    NotCancellable,

    #[error("Order already paid")]
    AlreadyPaid,

    #[error("Concurrent modification, retry the operation")]
    ConcurrentModification,

    // ========== Submission Errors ==========
    #[error("Shopping cart is empty")]
    EmptyCart,

    #[error("Delivery address out of range ({0} distance-units)")]
    OutOfDeliveryRange(u32),

    #[error("Delivery route planning failed: {0}")]
    DeliveryPlanningFailed(String),

    // ========== Collaborator Errors ==========
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            // An optimistic-update conflict is its own caller-visible
            // condition, not an opaque store failure.
            StoreError::VersionConflict(_) => OrderError::ConcurrentModification,
            other => OrderError::Store(other),
        }
    }
}

/// Result type for lifecycle and read-path operations
pub type OrderResult<T> = Result<T, OrderError>;
