//! The storage boundary for catalog, carts, orders, and payments.

use async_trait::async_trait;
use common::{CartId, LineId, Money, OrderId, ProductId, UserId, Variant};

use crate::error::Result;
use crate::records::{
    Cart, CartLine, Category, NewCategory, NewPaymentAttempt, NewProduct, Order, OrderDraft,
    PaymentAttempt, Product,
};

/// Catalog listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFilter {
    /// Every product.
    All,
    /// Products in one category.
    Category(common::CategoryId),
    /// Products flagged as featured.
    Featured,
}

/// Provider outcome applied to a correlated payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentUpdate {
    /// The provider confirmed the payment; `receipt` is its receipt number.
    Success { receipt: Option<String> },
    /// The provider reported failure or the customer cancelled.
    Failure,
}

/// What applying a provider callback actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackApplication {
    /// The attempt and its order were transitioned in this call.
    Applied,
    /// The attempt had already succeeded; nothing was changed.
    AlreadyApplied,
    /// No attempt carries the given checkout request id.
    Unmatched,
}

/// Storage operations for the commerce workflows.
///
/// Methods are the system's atomic units: each call either fully commits
/// or leaves no trace. Compound mutations (merge-add, cart conversion,
/// callback application) run inside a single transaction in the Postgres
/// backend and behind a single write lock in the in-memory backend.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    // -- catalog --

    /// Inserts a category.
    async fn insert_category(&self, new: NewCategory) -> Result<Category>;

    /// Inserts a product.
    async fn insert_product(&self, new: NewProduct) -> Result<Product>;

    /// Lists all categories.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Looks up a category by its slug.
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// Lists products matching the filter, newest first.
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>>;

    /// Looks up one product.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Replaces a product's current price.
    async fn set_product_price(&self, id: ProductId, price: Money) -> Result<bool>;

    // -- cart --

    /// Returns the user's cart, creating an empty one on first access.
    ///
    /// This is the only path to a cart; it enforces one cart per user.
    async fn get_or_create_cart(&self, user: UserId) -> Result<Cart>;

    /// The cart's lines joined with current product data, in insertion order.
    async fn cart_lines(&self, cart: CartId) -> Result<Vec<CartLine>>;

    /// Adds a line, or increments the quantity of the existing line with
    /// the same (product, variant). Returns the resulting line.
    async fn add_or_merge_line(
        &self,
        cart: CartId,
        product: ProductId,
        quantity: u32,
        variant: Variant,
    ) -> Result<CartLine>;

    /// Sets a line's quantity exactly; `quantity <= 0` removes the line.
    ///
    /// Scoped to the owning user: returns `false` when the line does not
    /// exist in one of the user's carts.
    async fn set_line_quantity(&self, user: UserId, line: LineId, quantity: i64) -> Result<bool>;

    /// Removes a line, scoped to the owning user.
    async fn delete_line(&self, user: UserId, line: LineId) -> Result<bool>;

    /// Removes every line from the user's cart. No-op without a cart.
    async fn clear_cart(&self, user: UserId) -> Result<()>;

    // -- orders --

    /// Converts the user's cart into an order.
    ///
    /// Inside one transaction: reads the cart lines, snapshots each unit
    /// price from the current catalog price, computes
    /// `subtotal = Σ(price × qty)` and `total = subtotal + delivery_fee`,
    /// inserts the order plus its lines, and deletes the cart lines.
    /// Returns `None` when the user has no cart or the cart is empty.
    async fn convert_cart_to_order(&self, draft: OrderDraft) -> Result<Option<Order>>;

    /// Looks up an order scoped to its owner.
    async fn find_order(&self, user: UserId, order: OrderId) -> Result<Option<Order>>;

    /// All of the user's orders, newest first.
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>>;

    // -- payments --

    /// Records a freshly initiated attempt as `pending`.
    ///
    /// In the same transaction, an order whose payment state is `failed`
    /// returns to `pending` — a retry is in flight again.
    async fn insert_payment(&self, new: NewPaymentAttempt) -> Result<PaymentAttempt>;

    /// The authoritative attempt for an order: latest `created_at`, ties
    /// broken by highest id. `None` when no attempt exists yet.
    async fn latest_payment(&self, order: OrderId) -> Result<Option<PaymentAttempt>>;

    /// Applies a provider outcome to the attempt correlated by
    /// `checkout_request_id`, updating attempt and order atomically.
    ///
    /// Success marks the attempt `success`, records the receipt, sets the
    /// order's payment state to `completed` and advances a `pending` order
    /// to `processing`. Failure marks the attempt `failed` and the order's
    /// payment state `failed` unless payment already completed. An attempt
    /// that already succeeded is never modified again.
    async fn apply_payment_update(
        &self,
        checkout_request_id: &str,
        update: PaymentUpdate,
    ) -> Result<CallbackApplication>;

    /// Marks an order paid without provider involvement (simulation).
    ///
    /// Scoped to the owner. Sets payment state `completed`, advances a
    /// `pending` order to `processing`, and stamps the latest attempt (if
    /// any) `success` with the given receipt. Returns the updated order.
    async fn force_payment_success(
        &self,
        user: UserId,
        order: OrderId,
        receipt: &str,
    ) -> Result<Option<Order>>;
}
