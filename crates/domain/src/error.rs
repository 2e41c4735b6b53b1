//! Domain error types.

use store::StoreError;
use thiserror::Error;

/// Errors surfaced by cart and order operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A required field is missing or malformed. Detected before any
    /// mutation begins.
    #[error("{field} is required")]
    Validation { field: &'static str },

    /// The entity is absent — or exists but belongs to another user.
    /// The two cases are indistinguishable on purpose.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Order creation was attempted against an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The store failed; the transaction was rolled back.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}
