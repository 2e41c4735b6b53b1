//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::Variant;
use domain::CartView;
use serde::{Deserialize, Serialize};
use store::{CartLine, CommerceStore};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::Caller;

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub selected_color: Option<String>,
    pub selected_size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartLineRequest {
    pub quantity: i64,
}

#[derive(Serialize)]
pub struct CartLineResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub image_url: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub selected_color: Option<String>,
    pub selected_size: Option<String>,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        let subtotal = line.line_total();
        Self {
            id: line.id.to_string(),
            product_id: line.product_id.to_string(),
            product_name: line.product_name,
            image_url: line.image_url,
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            subtotal_cents: subtotal.cents(),
            selected_color: line.variant.color,
            selected_size: line.variant.size,
        }
    }
}

#[derive(Serialize)]
pub struct CartResponse {
    pub cart_id: String,
    pub items: Vec<CartLineResponse>,
    pub total_cents: i64,
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        Self {
            cart_id: view.cart.id.to_string(),
            total_cents: view.total.cents(),
            items: view.lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// GET /api/cart — the caller's cart, created lazily.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user): Caller,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state.carts.view(user).await?;
    Ok(Json(view.into()))
}

/// POST /api/cart/add — add a product (merges with an identical line).
#[tracing::instrument(skip(state, req))]
pub async fn add<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user): Caller,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let variant = Variant::new(req.selected_color, req.selected_size);
    let view = state
        .carts
        .add_line(user, req.product_id.into(), req.quantity, variant)
        .await?;
    Ok(Json(view.into()))
}

/// PUT /api/cart/update/{line_id} — set a line's quantity exactly.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user): Caller,
    Path(line_id): Path<Uuid>,
    Json(req): Json<UpdateCartLineRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state
        .carts
        .update_line(user, line_id.into(), req.quantity)
        .await?;
    Ok(Json(view.into()))
}

/// DELETE /api/cart/remove/{line_id} — remove one line.
#[tracing::instrument(skip(state))]
pub async fn remove<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user): Caller,
    Path(line_id): Path<Uuid>,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state.carts.remove_line(user, line_id.into()).await?;
    Ok(Json(view.into()))
}

/// DELETE /api/cart/clear — drop every line.
#[tracing::instrument(skip(state))]
pub async fn clear<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user): Caller,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.carts.clear(user).await?;
    Ok(Json(serde_json::json!({ "message": "cart cleared" })))
}
