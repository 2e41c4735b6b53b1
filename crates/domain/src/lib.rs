//! Cart aggregate and order workflow.
//!
//! [`CartService`] owns the mutable per-user staging area; [`OrderService`]
//! converts a cart into an immutable-priced order in a single atomic step.
//! Both are thin orchestration over a [`store::CommerceStore`], which is
//! where the transactions live.

pub mod cart;
pub mod delivery;
pub mod error;
pub mod order;

pub use cart::{CartService, CartView};
pub use delivery::DeliveryDraft;
pub use error::DomainError;
pub use order::{DEFAULT_DELIVERY_FEE, OrderService};
