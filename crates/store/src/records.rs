//! Persisted records and the input structs that create them.

use chrono::{DateTime, Utc};
use common::{CartId, CategoryId, LineId, Money, OrderId, PaymentId, ProductId, UserId, Variant};
use serde::{Deserialize, Serialize};

use crate::status::{AttemptStatus, OrderStatus, PaymentMethod, PaymentState};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Current unit price. Cart previews read this live; orders snapshot it.
    pub price: Money,
    pub old_price: Option<Money>,
    pub category_id: CategoryId,
    pub image_url: String,
    pub additional_images: Vec<String>,
    pub stock: i32,
    pub color_options: Vec<String>,
    pub size_options: Vec<String>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub old_price: Option<Money>,
    pub category_id: CategoryId,
    pub image_url: String,
    pub additional_images: Vec<String>,
    pub stock: i32,
    pub color_options: Vec<String>,
    pub size_options: Vec<String>,
    pub is_featured: bool,
}

/// A user's cart. One per user, created lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A cart line joined with the product it references.
///
/// `unit_price` is the product's *current* price — preview semantics only.
/// Order creation re-reads prices inside its own transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub product_name: String,
    pub image_url: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub variant: Variant,
}

impl CartLine {
    /// Current price times quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Delivery details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub phone_number: String,
    pub full_name: String,
    pub county: String,
    pub town: String,
    pub address: String,
}

/// A durable order with its immutable line snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total_amount: Money,
    pub delivery: DeliveryInfo,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_state: PaymentState,
    pub created_at: DateTime<Utc>,
}

/// A line snapshotted onto an order at conversion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: LineId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at the moment the order was created. Never recomputed.
    pub unit_price: Money,
    pub variant: Variant,
}

impl OrderLine {
    /// Snapshotted price times quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Input for converting a cart into an order.
///
/// Totals are not part of the draft: the store computes them from the cart
/// lines and current catalog prices inside the conversion transaction.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub user_id: UserId,
    pub delivery: DeliveryInfo,
    pub payment_method: PaymentMethod,
    pub delivery_fee: Money,
}

/// One request/response cycle with the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub transaction_id: String,
    /// Provider correlation id echoed back in the asynchronous callback.
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub phone_number: String,
    pub amount: Money,
    pub status: AttemptStatus,
    pub receipt_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a freshly initiated payment attempt.
#[derive(Debug, Clone)]
pub struct NewPaymentAttempt {
    pub order_id: OrderId,
    pub transaction_id: String,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub phone_number: String,
    pub amount: Money,
}
