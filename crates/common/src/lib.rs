//! Shared types for the soko backend.
//!
//! Identifier newtypes, the [`Money`] value type, and the [`Variant`]
//! (color/size) selection used by cart and order lines.

mod ids;
mod money;
mod variant;

pub use ids::{CartId, CategoryId, LineId, OrderId, PaymentId, ProductId, UserId};
pub use money::Money;
pub use variant::Variant;
