//! Payment error types.

use store::StoreError;
use thiserror::Error;

/// Errors surfaced by payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The order is absent or belongs to another user.
    #[error("order not found")]
    OrderNotFound,

    /// The order's payment has already completed.
    #[error("order already paid")]
    AlreadyPaid,

    /// The provider rejected the initiation; no attempt was recorded.
    #[error("payment initiation failed: {0}")]
    InitiationFailed(String),

    /// The store failed; the transaction was rolled back.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}
