//! The per-user cart aggregate.

use common::{LineId, Money, ProductId, UserId, Variant};
use serde::Serialize;
use store::{Cart, CartLine, CommerceStore};

use crate::error::DomainError;

/// A cart with its lines and preview total.
///
/// The total is derived from *current* catalog prices at read time. It is
/// a preview for the storefront; order creation computes its own totals
/// inside the conversion transaction.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
    pub total: Money,
}

/// Cart operations, all scoped to the calling user.
///
/// Cross-user access fails with `NotFound` — the same signal as a missing
/// entity, so nothing about other users' carts leaks.
pub struct CartService<S: CommerceStore> {
    store: S,
}

impl<S: CommerceStore> CartService<S> {
    /// Creates a cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn assemble_view(&self, cart: Cart) -> Result<CartView, DomainError> {
        let lines = self.store.cart_lines(cart.id).await?;
        let total = lines.iter().map(CartLine::line_total).sum();
        Ok(CartView { cart, lines, total })
    }

    /// Returns the user's cart, creating an empty one on first access.
    #[tracing::instrument(skip(self))]
    pub async fn view(&self, user: UserId) -> Result<CartView, DomainError> {
        let cart = self.store.get_or_create_cart(user).await?;
        self.assemble_view(cart).await
    }

    /// Adds a product to the cart.
    ///
    /// Re-adding the same (product, variant) increments the existing line
    /// instead of duplicating it.
    #[tracing::instrument(skip(self))]
    pub async fn add_line(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
        variant: Variant,
    ) -> Result<CartView, DomainError> {
        if quantity == 0 {
            return Err(DomainError::Validation { field: "quantity" });
        }
        if self.store.find_product(product).await?.is_none() {
            return Err(DomainError::NotFound("product"));
        }

        let cart = self.store.get_or_create_cart(user).await?;
        self.store
            .add_or_merge_line(cart.id, product, quantity, variant)
            .await?;
        metrics::counter!("cart_lines_added_total").increment(1);
        self.assemble_view(cart).await
    }

    /// Sets a line's quantity exactly; zero or negative removes the line.
    #[tracing::instrument(skip(self))]
    pub async fn update_line(
        &self,
        user: UserId,
        line: LineId,
        quantity: i64,
    ) -> Result<CartView, DomainError> {
        if !self.store.set_line_quantity(user, line, quantity).await? {
            return Err(DomainError::NotFound("cart item"));
        }
        let cart = self.store.get_or_create_cart(user).await?;
        self.assemble_view(cart).await
    }

    /// Removes a line from the cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_line(&self, user: UserId, line: LineId) -> Result<CartView, DomainError> {
        if !self.store.delete_line(user, line).await? {
            return Err(DomainError::NotFound("cart item"));
        }
        let cart = self.store.get_or_create_cart(user).await?;
        self.assemble_view(cart).await
    }

    /// Removes every line. No-op when the cart is already empty.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user: UserId) -> Result<(), DomainError> {
        self.store.clear_cart(user).await?;
        Ok(())
    }
}
