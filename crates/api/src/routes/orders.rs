//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::Money;
use domain::DeliveryDraft;
use serde::{Deserialize, Serialize};
use store::{CommerceStore, Order, OrderLine, PaymentMethod};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::Caller;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(flatten)]
    pub delivery: DeliveryDraft,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_fee_cents: Option<i64>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub selected_color: Option<String>,
    pub selected_size: Option<String>,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(line: OrderLine) -> Self {
        let subtotal = line.line_total();
        Self {
            id: line.id.to_string(),
            product_id: line.product_id.to_string(),
            product_name: line.product_name,
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            subtotal_cents: subtotal.cents(),
            selected_color: line.variant.color,
            selected_size: line.variant.size,
        }
    }
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_cents: i64,
    pub phone_number: String,
    pub full_name: String,
    pub county: String,
    pub town: String,
    pub address: String,
    pub items: Vec<OrderLineResponse>,
    pub created_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            status: order.status.to_string(),
            payment_status: order.payment_state.to_string(),
            payment_method: order.payment_method.to_string(),
            subtotal_cents: order.subtotal.cents(),
            delivery_fee_cents: order.delivery_fee.cents(),
            total_cents: order.total_amount.cents(),
            phone_number: order.delivery.phone_number,
            full_name: order.delivery.full_name,
            county: order.delivery.county,
            town: order.delivery.town,
            address: order.delivery.address,
            items: order.lines.into_iter().map(Into::into).collect(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

/// POST /api/orders — convert the caller's cart into an order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user): Caller,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state
        .orders
        .create_order(
            user,
            req.delivery,
            req.payment_method,
            req.delivery_fee_cents.map(Money::from_cents),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /api/orders — the caller's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user): Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders(user).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /api/orders/{id} — one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get_order(user, id.into()).await?;
    Ok(Json(order.into()))
}
