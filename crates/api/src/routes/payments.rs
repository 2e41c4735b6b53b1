//! Payment endpoints.
//!
//! The callback route is provider-facing: it takes no caller identity and
//! always acknowledges positively, even when the payload is unusable.
//! Transport-level authenticity (signature or IP allowlist) belongs to
//! the fronting proxy.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use payment::{CallbackAck, PaymentIntent, PaymentStatusView, StkCallbackEnvelope};
use serde::{Deserialize, Serialize};
use store::{CommerceStore, PaymentAttempt};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::Caller;

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub order_id: Uuid,
    pub phone_number: Option<String>,
}

#[derive(Serialize)]
pub struct PaymentIntentResponse {
    pub order_id: String,
    pub transaction_id: String,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub customer_message: String,
}

impl From<PaymentIntent> for PaymentIntentResponse {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            order_id: intent.order_id.to_string(),
            transaction_id: intent.transaction_id,
            checkout_request_id: intent.checkout_request_id,
            merchant_request_id: intent.merchant_request_id,
            customer_message: intent.customer_message,
        }
    }
}

#[derive(Serialize)]
pub struct AttemptResponse {
    pub id: String,
    pub transaction_id: String,
    pub checkout_request_id: String,
    pub phone_number: String,
    pub amount_cents: i64,
    pub status: String,
    pub receipt_number: Option<String>,
    pub created_at: String,
}

impl From<PaymentAttempt> for AttemptResponse {
    fn from(attempt: PaymentAttempt) -> Self {
        Self {
            id: attempt.id.to_string(),
            transaction_id: attempt.transaction_id,
            checkout_request_id: attempt.checkout_request_id,
            phone_number: attempt.phone_number,
            amount_cents: attempt.amount.cents(),
            status: attempt.status.to_string(),
            receipt_number: attempt.receipt_number,
            created_at: attempt.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct PaymentStatusResponse {
    pub order_id: String,
    pub order_status: String,
    pub payment_status: String,
    pub payment: Option<AttemptResponse>,
}

impl From<PaymentStatusView> for PaymentStatusResponse {
    fn from(view: PaymentStatusView) -> Self {
        Self {
            order_id: view.order_id.to_string(),
            order_status: view.order_status.to_string(),
            payment_status: view.payment_state.to_string(),
            payment: view.latest_attempt.map(Into::into),
        }
    }
}

/// POST /api/payments/mpesa/initiate — start an STK push for an order.
#[tracing::instrument(skip(state, req))]
pub async fn initiate<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user): Caller,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let intent = state
        .payments
        .initiate(user, req.order_id.into(), req.phone_number)
        .await?;
    Ok(Json(intent.into()))
}

/// POST /api/payments/mpesa/callback — provider-initiated confirmation.
///
/// The payload is parsed leniently: a malformed document is logged and
/// acknowledged, never bounced back to the provider.
#[tracing::instrument(skip(state, payload))]
pub async fn callback<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(payload): Json<serde_json::Value>,
) -> Json<CallbackAck> {
    match serde_json::from_value::<StkCallbackEnvelope>(payload) {
        Ok(envelope) => Json(state.payments.resolve_callback(envelope).await),
        Err(e) => {
            tracing::warn!(error = %e, "unparseable payment callback");
            Json(CallbackAck::accepted())
        }
    }
}

/// GET /api/payments/{order_id}/status — payment status for an order.
#[tracing::instrument(skip(state))]
pub async fn status<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user): Caller,
    Path(order_id): Path<Uuid>,
) -> Result<Json<PaymentStatusResponse>, ApiError> {
    let view = state
        .payments
        .check_status(user, order_id.into())
        .await?;
    Ok(Json(view.into()))
}

/// POST /api/payments/mpesa/simulate-success/{order_id} — mark an order
/// paid without the provider. Registered only when payment simulation is
/// enabled in configuration.
#[tracing::instrument(skip(state))]
pub async fn simulate_success<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user): Caller,
    Path(order_id): Path<Uuid>,
) -> Result<Json<super::orders::OrderResponse>, ApiError> {
    let order = state
        .payments
        .simulate_success(user, order_id.into())
        .await?;
    Ok(Json(order.into()))
}
