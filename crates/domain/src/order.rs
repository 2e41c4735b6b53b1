//! The order workflow: one-shot conversion of a cart into a durable order.

use common::{Money, OrderId, UserId};
use store::{CommerceStore, Order, OrderDraft, PaymentMethod};

use crate::delivery::DeliveryDraft;
use crate::error::DomainError;

/// Flat delivery fee applied when the caller does not supply one.
pub const DEFAULT_DELIVERY_FEE: Money = Money::from_shillings(500);

/// Order operations, scoped to the calling user.
pub struct OrderService<S: CommerceStore> {
    store: S,
}

impl<S: CommerceStore> OrderService<S> {
    /// Creates an order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Converts the user's cart into an order.
    ///
    /// Validation happens before anything is written. The conversion
    /// itself — price snapshot, totals, order + line inserts, cart drain —
    /// is one atomic store operation; on failure nothing persists.
    #[tracing::instrument(skip(self, delivery))]
    pub async fn create_order(
        &self,
        user: UserId,
        delivery: DeliveryDraft,
        payment_method: Option<PaymentMethod>,
        delivery_fee: Option<Money>,
    ) -> Result<Order, DomainError> {
        let delivery = delivery.validate()?;
        let draft = OrderDraft {
            user_id: user,
            delivery,
            payment_method: payment_method.unwrap_or_default(),
            delivery_fee: delivery_fee.unwrap_or(DEFAULT_DELIVERY_FEE),
        };

        let order = self
            .store
            .convert_cart_to_order(draft)
            .await?
            .ok_or(DomainError::EmptyCart)?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total_amount, "order created");
        Ok(order)
    }

    /// Looks up one of the caller's orders.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, user: UserId, order: OrderId) -> Result<Order, DomainError> {
        self.store
            .find_order(user, order)
            .await?
            .ok_or(DomainError::NotFound("order"))
    }

    /// All of the caller's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders(user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Variant;
    use store::{InMemoryStore, OrderStatus, PaymentState, ProductFilter, seed_demo_catalog};

    fn delivery_draft() -> DeliveryDraft {
        DeliveryDraft {
            phone_number: Some("0712345678".into()),
            full_name: Some("Wanjiku Kamau".into()),
            county: Some("Nairobi".into()),
            town: Some("Westlands".into()),
            address: Some("Mpaka Rd 12".into()),
        }
    }

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        seed_demo_catalog(&store).await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_order_requires_delivery_fields() {
        let store = seeded_store().await;
        let service = OrderService::new(store);

        let mut draft = delivery_draft();
        draft.county = None;
        let result = service
            .create_order(UserId::new(), draft, None, None)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Validation { field: "county" })
        ));
    }

    #[tokio::test]
    async fn create_order_rejects_empty_cart() {
        let store = seeded_store().await;
        let service = OrderService::new(store.clone());
        let user = UserId::new();
        store.get_or_create_cart(user).await.unwrap();

        let result = service
            .create_order(user, delivery_draft(), None, None)
            .await;
        assert!(matches!(result, Err(DomainError::EmptyCart)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn create_order_defaults_fee_and_starts_pending() {
        let store = seeded_store().await;
        let product = store.list_products(ProductFilter::All).await.unwrap()[0].id;
        let user = UserId::new();
        let cart = store.get_or_create_cart(user).await.unwrap();
        store
            .add_or_merge_line(cart.id, product, 1, Variant::none())
            .await
            .unwrap();

        let service = OrderService::new(store);
        let order = service
            .create_order(user, delivery_draft(), None, None)
            .await
            .unwrap();

        assert_eq!(order.delivery_fee, DEFAULT_DELIVERY_FEE);
        assert_eq!(order.total_amount, order.subtotal + DEFAULT_DELIVERY_FEE);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_state, PaymentState::Pending);
        assert_eq!(order.payment_method, PaymentMethod::Mpesa);
    }

    #[tokio::test]
    async fn orders_are_listed_newest_first() {
        let store = seeded_store().await;
        let product = store.list_products(ProductFilter::All).await.unwrap()[0].id;
        let user = UserId::new();
        let service = OrderService::new(store.clone());

        let mut ids = Vec::new();
        for _ in 0..3 {
            let cart = store.get_or_create_cart(user).await.unwrap();
            store
                .add_or_merge_line(cart.id, product, 1, Variant::none())
                .await
                .unwrap();
            ids.push(
                service
                    .create_order(user, delivery_draft(), None, None)
                    .await
                    .unwrap()
                    .id,
            );
        }

        let listed: Vec<_> = service
            .list_orders(user)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn get_order_is_scoped_to_owner() {
        let store = seeded_store().await;
        let product = store.list_products(ProductFilter::All).await.unwrap()[0].id;
        let user = UserId::new();
        let cart = store.get_or_create_cart(user).await.unwrap();
        store
            .add_or_merge_line(cart.id, product, 1, Variant::none())
            .await
            .unwrap();

        let service = OrderService::new(store);
        let order = service
            .create_order(user, delivery_draft(), None, None)
            .await
            .unwrap();

        let result = service.get_order(UserId::new(), order.id).await;
        assert!(matches!(result, Err(DomainError::NotFound("order"))));
    }
}
