//! Relational persistence for the soko backend.
//!
//! Defines the [`CommerceStore`] trait — the storage boundary for catalog,
//! carts, orders, and payment attempts — with two implementations:
//! [`PostgresStore`] (sqlx) and [`InMemoryStore`] (used by tests and the
//! default development server). Every multi-row mutation the workflows
//! depend on (merge-add of a cart line, cart-to-order conversion, callback
//! application) is a single trait method executed atomically by both
//! backends.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod seed;
pub mod status;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{
    Cart, CartLine, Category, DeliveryInfo, NewCategory, NewPaymentAttempt, NewProduct, Order,
    OrderDraft, OrderLine, PaymentAttempt, Product,
};
pub use seed::seed_demo_catalog;
pub use status::{AttemptStatus, OrderStatus, PaymentMethod, PaymentState};
pub use store::{CallbackApplication, CommerceStore, PaymentUpdate, ProductFilter};
