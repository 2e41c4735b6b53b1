//! In-memory store implementation.
//!
//! Backs the test suites and the default development server. A single
//! `RwLock` serializes every operation, which gives each trait method the
//! same all-or-nothing behavior the Postgres backend gets from
//! transactions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CartId, CategoryId, LineId, Money, OrderId, PaymentId, ProductId, UserId, Variant};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::records::{
    Cart, CartLine, Category, NewCategory, NewPaymentAttempt, NewProduct, Order, OrderDraft,
    OrderLine, PaymentAttempt, Product,
};
use crate::status::{AttemptStatus, OrderStatus, PaymentState};
use crate::store::{CallbackApplication, CommerceStore, PaymentUpdate, ProductFilter};

#[derive(Debug, Clone)]
struct StoredLine {
    id: LineId,
    cart_id: CartId,
    product_id: ProductId,
    quantity: u32,
    variant: Variant,
}

#[derive(Debug, Default)]
struct State {
    categories: Vec<Category>,
    products: Vec<Product>,
    carts: Vec<Cart>,
    lines: Vec<StoredLine>,
    orders: Vec<Order>,
    payments: Vec<PaymentAttempt>,
    fail_order_insert: bool,
}

impl State {
    fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn user_cart_ids(&self, user: UserId) -> Vec<CartId> {
        self.carts
            .iter()
            .filter(|c| c.user_id == user)
            .map(|c| c.id)
            .collect()
    }

    fn join_line(&self, line: &StoredLine) -> Result<CartLine> {
        let product = self
            .product(line.product_id)
            .ok_or_else(|| StoreError::Corrupt(format!("line references missing product {}", line.product_id)))?;
        Ok(CartLine {
            id: line.id,
            cart_id: line.cart_id,
            product_id: line.product_id,
            product_name: product.name.clone(),
            image_url: product.image_url.clone(),
            unit_price: product.price,
            quantity: line.quantity,
            variant: line.variant.clone(),
        })
    }

    fn latest_attempt_index(&self, order: OrderId) -> Option<usize> {
        self.payments
            .iter()
            .enumerate()
            .filter(|(_, p)| p.order_id == order)
            .max_by_key(|(_, p)| (p.created_at, p.id))
            .map(|(i, _)| i)
    }
}

/// In-memory [`CommerceStore`] implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next cart-to-order conversion fail after its reads,
    /// before anything is committed. Used by rollback tests.
    pub async fn set_fail_order_insert(&self, fail: bool) {
        self.state.write().await.fail_order_insert = fail;
    }

    /// Number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Number of persisted payment attempts.
    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.len()
    }
}

#[async_trait]
impl CommerceStore for InMemoryStore {
    async fn insert_category(&self, new: NewCategory) -> Result<Category> {
        let mut state = self.state.write().await;
        let category = Category {
            id: CategoryId::new(),
            name: new.name,
            slug: new.slug,
            description: new.description,
            image_url: new.image_url,
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;
        let product = Product {
            id: ProductId::new(),
            name: new.name,
            description: new.description,
            price: new.price,
            old_price: new.old_price,
            category_id: new.category_id,
            image_url: new.image_url,
            additional_images: new.additional_images,
            stock: new.stock,
            color_options: new.color_options,
            size_options: new.size_options,
            is_featured: new.is_featured,
            created_at: Utc::now(),
        };
        state.products.push(product.clone());
        Ok(product)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories = state.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let state = self.state.read().await;
        Ok(state.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .iter()
            .rev()
            .filter(|p| match filter {
                ProductFilter::All => true,
                ProductFilter::Category(id) => p.category_id == id,
                ProductFilter::Featured => p.is_featured,
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.product(id).cloned())
    }

    async fn set_product_price(&self, id: ProductId, price: Money) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.products.iter_mut().find(|p| p.id == id) {
            Some(product) => {
                product.price = price;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_or_create_cart(&self, user: UserId) -> Result<Cart> {
        let mut state = self.state.write().await;
        if let Some(cart) = state.carts.iter().find(|c| c.user_id == user) {
            return Ok(cart.clone());
        }
        let cart = Cart {
            id: CartId::new(),
            user_id: user,
            created_at: Utc::now(),
        };
        state.carts.push(cart.clone());
        Ok(cart)
    }

    async fn cart_lines(&self, cart: CartId) -> Result<Vec<CartLine>> {
        let state = self.state.read().await;
        state
            .lines
            .iter()
            .filter(|l| l.cart_id == cart)
            .map(|l| state.join_line(l))
            .collect()
    }

    async fn add_or_merge_line(
        &self,
        cart: CartId,
        product: ProductId,
        quantity: u32,
        variant: Variant,
    ) -> Result<CartLine> {
        let mut state = self.state.write().await;
        let merged = match state
            .lines
            .iter_mut()
            .find(|l| l.cart_id == cart && l.product_id == product && l.variant == variant)
        {
            Some(line) => {
                line.quantity += quantity;
                line.clone()
            }
            None => {
                let line = StoredLine {
                    id: LineId::new(),
                    cart_id: cart,
                    product_id: product,
                    quantity,
                    variant,
                };
                state.lines.push(line.clone());
                line
            }
        };
        state.join_line(&merged)
    }

    async fn set_line_quantity(&self, user: UserId, line: LineId, quantity: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let owned = state.user_cart_ids(user);
        let Some(index) = state
            .lines
            .iter()
            .position(|l| l.id == line && owned.contains(&l.cart_id))
        else {
            return Ok(false);
        };
        if quantity <= 0 {
            state.lines.remove(index);
        } else {
            state.lines[index].quantity = quantity as u32;
        }
        Ok(true)
    }

    async fn delete_line(&self, user: UserId, line: LineId) -> Result<bool> {
        let mut state = self.state.write().await;
        let owned = state.user_cart_ids(user);
        let Some(index) = state
            .lines
            .iter()
            .position(|l| l.id == line && owned.contains(&l.cart_id))
        else {
            return Ok(false);
        };
        state.lines.remove(index);
        Ok(true)
    }

    async fn clear_cart(&self, user: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        let owned = state.user_cart_ids(user);
        state.lines.retain(|l| !owned.contains(&l.cart_id));
        Ok(())
    }

    async fn convert_cart_to_order(&self, draft: OrderDraft) -> Result<Option<Order>> {
        let mut state = self.state.write().await;

        let Some(cart_id) = state
            .carts
            .iter()
            .find(|c| c.user_id == draft.user_id)
            .map(|c| c.id)
        else {
            return Ok(None);
        };

        let cart_lines: Vec<StoredLine> = state
            .lines
            .iter()
            .filter(|l| l.cart_id == cart_id)
            .cloned()
            .collect();
        if cart_lines.is_empty() {
            return Ok(None);
        }

        if state.fail_order_insert {
            return Err(StoreError::Backend("injected order insert failure".into()));
        }

        let mut order_lines = Vec::with_capacity(cart_lines.len());
        let mut subtotal = Money::zero();
        for line in &cart_lines {
            let product = state.product(line.product_id).ok_or_else(|| {
                StoreError::Corrupt(format!("line references missing product {}", line.product_id))
            })?;
            let order_line = OrderLine {
                id: LineId::new(),
                product_id: line.product_id,
                product_name: product.name.clone(),
                quantity: line.quantity,
                unit_price: product.price,
                variant: line.variant.clone(),
            };
            subtotal += order_line.line_total();
            order_lines.push(order_line);
        }

        let order = Order {
            id: OrderId::new(),
            user_id: draft.user_id,
            lines: order_lines,
            subtotal,
            delivery_fee: draft.delivery_fee,
            total_amount: subtotal + draft.delivery_fee,
            delivery: draft.delivery,
            payment_method: draft.payment_method,
            status: OrderStatus::Pending,
            payment_state: PaymentState::Pending,
            created_at: Utc::now(),
        };

        state.orders.push(order.clone());
        state.lines.retain(|l| l.cart_id != cart_id);
        Ok(Some(order))
    }

    async fn find_order(&self, user: UserId, order: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.id == order && o.user_id == user)
            .cloned())
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn insert_payment(&self, new: NewPaymentAttempt) -> Result<PaymentAttempt> {
        let mut state = self.state.write().await;
        let Some(order) = state.orders.iter_mut().find(|o| o.id == new.order_id) else {
            return Err(StoreError::Corrupt(format!(
                "payment references missing order {}",
                new.order_id
            )));
        };
        if order.payment_state == PaymentState::Failed {
            order.payment_state = PaymentState::Pending;
        }
        let attempt = PaymentAttempt {
            id: PaymentId::new(),
            order_id: new.order_id,
            transaction_id: new.transaction_id,
            checkout_request_id: new.checkout_request_id,
            merchant_request_id: new.merchant_request_id,
            phone_number: new.phone_number,
            amount: new.amount,
            status: AttemptStatus::Pending,
            receipt_number: None,
            created_at: Utc::now(),
        };
        state.payments.push(attempt.clone());
        Ok(attempt)
    }

    async fn latest_payment(&self, order: OrderId) -> Result<Option<PaymentAttempt>> {
        let state = self.state.read().await;
        Ok(state
            .latest_attempt_index(order)
            .map(|i| state.payments[i].clone()))
    }

    async fn apply_payment_update(
        &self,
        checkout_request_id: &str,
        update: PaymentUpdate,
    ) -> Result<CallbackApplication> {
        let mut state = self.state.write().await;
        let Some(index) = state
            .payments
            .iter()
            .position(|p| p.checkout_request_id == checkout_request_id)
        else {
            return Ok(CallbackApplication::Unmatched);
        };
        if state.payments[index].status == AttemptStatus::Success {
            return Ok(CallbackApplication::AlreadyApplied);
        }

        let order_id = state.payments[index].order_id;
        match update {
            PaymentUpdate::Success { receipt } => {
                let attempt = &mut state.payments[index];
                attempt.status = AttemptStatus::Success;
                if receipt.is_some() {
                    attempt.receipt_number = receipt;
                }
                if let Some(order) = state.orders.iter_mut().find(|o| o.id == order_id) {
                    order.payment_state = PaymentState::Completed;
                    if order.status == OrderStatus::Pending {
                        order.status = OrderStatus::Processing;
                    }
                }
            }
            PaymentUpdate::Failure => {
                state.payments[index].status = AttemptStatus::Failed;
                if let Some(order) = state.orders.iter_mut().find(|o| o.id == order_id)
                    && order.payment_state != PaymentState::Completed
                {
                    order.payment_state = PaymentState::Failed;
                }
            }
        }
        Ok(CallbackApplication::Applied)
    }

    async fn force_payment_success(
        &self,
        user: UserId,
        order: OrderId,
        receipt: &str,
    ) -> Result<Option<Order>> {
        let mut state = self.state.write().await;
        let Some(order_index) = state
            .orders
            .iter()
            .position(|o| o.id == order && o.user_id == user)
        else {
            return Ok(None);
        };

        {
            let order = &mut state.orders[order_index];
            order.payment_state = PaymentState::Completed;
            if order.status == OrderStatus::Pending {
                order.status = OrderStatus::Processing;
            }
        }

        if let Some(attempt_index) = state.latest_attempt_index(order) {
            let attempt = &mut state.payments[attempt_index];
            attempt.status = AttemptStatus::Success;
            attempt.receipt_number = Some(receipt.to_string());
        }

        Ok(Some(state.orders[order_index].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DeliveryInfo;
    use crate::status::PaymentMethod;

    async fn store_with_product(price: Money) -> (InMemoryStore, ProductId) {
        let store = InMemoryStore::new();
        let category = store
            .insert_category(NewCategory {
                name: "Shoes".into(),
                slug: "shoes".into(),
                description: None,
                image_url: None,
            })
            .await
            .unwrap();
        let product = store
            .insert_product(NewProduct {
                name: "Runner".into(),
                description: None,
                price,
                old_price: None,
                category_id: category.id,
                image_url: "/img/runner.jpg".into(),
                additional_images: vec![],
                stock: 10,
                color_options: vec!["Black".into()],
                size_options: vec!["42".into()],
                is_featured: false,
            })
            .await
            .unwrap();
        (store, product.id)
    }

    fn delivery() -> DeliveryInfo {
        DeliveryInfo {
            phone_number: "0712345678".into(),
            full_name: "Wanjiku Kamau".into(),
            county: "Nairobi".into(),
            town: "Westlands".into(),
            address: "Mpaka Rd 12".into(),
        }
    }

    #[tokio::test]
    async fn get_or_create_cart_is_idempotent() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let first = store.get_or_create_cart(user).await.unwrap();
        let second = store.get_or_create_cart(user).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn add_or_merge_combines_same_variant_only() {
        let (store, product) = store_with_product(Money::from_shillings(100)).await;
        let cart = store.get_or_create_cart(UserId::new()).await.unwrap();

        let red = Variant::new(Some("Red".into()), None);
        store
            .add_or_merge_line(cart.id, product, 2, red.clone())
            .await
            .unwrap();
        let merged = store
            .add_or_merge_line(cart.id, product, 3, red.clone())
            .await
            .unwrap();
        assert_eq!(merged.quantity, 5);

        store
            .add_or_merge_line(cart.id, product, 1, Variant::none())
            .await
            .unwrap();
        let lines = store.cart_lines(cart.id).await.unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn line_mutations_are_scoped_to_owner() {
        let (store, product) = store_with_product(Money::from_shillings(100)).await;
        let owner = UserId::new();
        let stranger = UserId::new();
        let cart = store.get_or_create_cart(owner).await.unwrap();
        let line = store
            .add_or_merge_line(cart.id, product, 1, Variant::none())
            .await
            .unwrap();

        assert!(!store.set_line_quantity(stranger, line.id, 5).await.unwrap());
        assert!(!store.delete_line(stranger, line.id).await.unwrap());
        assert!(store.set_line_quantity(owner, line.id, 5).await.unwrap());
        assert!(store.delete_line(owner, line.id).await.unwrap());
    }

    #[tokio::test]
    async fn conversion_snapshots_prices_and_drains_cart() {
        let (store, product) = store_with_product(Money::from_shillings(1200)).await;
        let user = UserId::new();
        let cart = store.get_or_create_cart(user).await.unwrap();
        store
            .add_or_merge_line(cart.id, product, 2, Variant::none())
            .await
            .unwrap();

        let order = store
            .convert_cart_to_order(OrderDraft {
                user_id: user,
                delivery: delivery(),
                payment_method: PaymentMethod::Mpesa,
                delivery_fee: Money::from_shillings(500),
            })
            .await
            .unwrap()
            .expect("cart had lines");

        assert_eq!(order.subtotal, Money::from_shillings(2400));
        assert_eq!(order.total_amount, Money::from_shillings(2900));
        assert_eq!(order.lines.len(), 1);
        assert!(store.cart_lines(cart.id).await.unwrap().is_empty());

        // A later price change must not touch the snapshot.
        store
            .set_product_price(product, Money::from_shillings(9999))
            .await
            .unwrap();
        let reloaded = store.find_order(user, order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.lines[0].unit_price, Money::from_shillings(1200));
        assert_eq!(reloaded.total_amount, Money::from_shillings(2900));
    }

    #[tokio::test]
    async fn conversion_of_empty_cart_returns_none() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        store.get_or_create_cart(user).await.unwrap();

        let result = store
            .convert_cart_to_order(OrderDraft {
                user_id: user,
                delivery: delivery(),
                payment_method: PaymentMethod::Mpesa,
                delivery_fee: Money::from_shillings(500),
            })
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn injected_failure_persists_nothing() {
        let (store, product) = store_with_product(Money::from_shillings(100)).await;
        let user = UserId::new();
        let cart = store.get_or_create_cart(user).await.unwrap();
        store
            .add_or_merge_line(cart.id, product, 1, Variant::none())
            .await
            .unwrap();

        store.set_fail_order_insert(true).await;
        let result = store
            .convert_cart_to_order(OrderDraft {
                user_id: user,
                delivery: delivery(),
                payment_method: PaymentMethod::Mpesa,
                delivery_fee: Money::from_shillings(500),
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.cart_lines(cart.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn callback_application_is_idempotent() {
        let (store, product) = store_with_product(Money::from_shillings(100)).await;
        let user = UserId::new();
        let cart = store.get_or_create_cart(user).await.unwrap();
        store
            .add_or_merge_line(cart.id, product, 1, Variant::none())
            .await
            .unwrap();
        let order = store
            .convert_cart_to_order(OrderDraft {
                user_id: user,
                delivery: delivery(),
                payment_method: PaymentMethod::Mpesa,
                delivery_fee: Money::from_shillings(500),
            })
            .await
            .unwrap()
            .unwrap();
        store
            .insert_payment(NewPaymentAttempt {
                order_id: order.id,
                transaction_id: "TXN1".into(),
                checkout_request_id: "ws_CO_1".into(),
                merchant_request_id: "MR1".into(),
                phone_number: "254712345678".into(),
                amount: order.total_amount,
            })
            .await
            .unwrap();

        let first = store
            .apply_payment_update(
                "ws_CO_1",
                PaymentUpdate::Success {
                    receipt: Some("QAZ123".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(first, CallbackApplication::Applied);

        let second = store
            .apply_payment_update(
                "ws_CO_1",
                PaymentUpdate::Success {
                    receipt: Some("OTHER".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(second, CallbackApplication::AlreadyApplied);

        let attempt = store.latest_payment(order.id).await.unwrap().unwrap();
        assert_eq!(attempt.status, AttemptStatus::Success);
        assert_eq!(attempt.receipt_number.as_deref(), Some("QAZ123"));

        let order = store.find_order(user, order.id).await.unwrap().unwrap();
        assert_eq!(order.payment_state, PaymentState::Completed);
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(store.payment_count().await, 1);
    }

    #[tokio::test]
    async fn failed_callback_then_retry_returns_to_pending() {
        let (store, product) = store_with_product(Money::from_shillings(100)).await;
        let user = UserId::new();
        let cart = store.get_or_create_cart(user).await.unwrap();
        store
            .add_or_merge_line(cart.id, product, 1, Variant::none())
            .await
            .unwrap();
        let order = store
            .convert_cart_to_order(OrderDraft {
                user_id: user,
                delivery: delivery(),
                payment_method: PaymentMethod::Mpesa,
                delivery_fee: Money::from_shillings(500),
            })
            .await
            .unwrap()
            .unwrap();

        store
            .insert_payment(NewPaymentAttempt {
                order_id: order.id,
                transaction_id: "TXN1".into(),
                checkout_request_id: "ws_CO_1".into(),
                merchant_request_id: "MR1".into(),
                phone_number: "254712345678".into(),
                amount: order.total_amount,
            })
            .await
            .unwrap();
        store
            .apply_payment_update("ws_CO_1", PaymentUpdate::Failure)
            .await
            .unwrap();
        let failed = store.find_order(user, order.id).await.unwrap().unwrap();
        assert_eq!(failed.payment_state, PaymentState::Failed);
        assert_eq!(failed.status, OrderStatus::Pending);

        store
            .insert_payment(NewPaymentAttempt {
                order_id: order.id,
                transaction_id: "TXN2".into(),
                checkout_request_id: "ws_CO_2".into(),
                merchant_request_id: "MR2".into(),
                phone_number: "254712345678".into(),
                amount: order.total_amount,
            })
            .await
            .unwrap();
        let retried = store.find_order(user, order.id).await.unwrap().unwrap();
        assert_eq!(retried.payment_state, PaymentState::Pending);

        let latest = store.latest_payment(order.id).await.unwrap().unwrap();
        assert_eq!(latest.transaction_id, "TXN2");
    }
}
