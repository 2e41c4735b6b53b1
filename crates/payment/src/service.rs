//! Payment reconciliation over a store and an injected provider.

use common::{OrderId, UserId};
use serde::Serialize;
use store::{
    CallbackApplication, CommerceStore, NewPaymentAttempt, Order, OrderStatus, PaymentAttempt,
    PaymentState, PaymentUpdate,
};

use crate::callback::{CallbackAck, StkCallbackEnvelope};
use crate::error::PaymentError;
use crate::phone::normalize_phone;
use crate::provider::{PaymentProvider, StkPushRequest};

/// Correlation identifiers returned to the caller after initiation.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub order_id: OrderId,
    pub transaction_id: String,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub customer_message: String,
}

/// Combined payment status for an order.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusView {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub payment_state: PaymentState,
    /// Most recent attempt, or `None` before the first initiation.
    pub latest_attempt: Option<PaymentAttempt>,
}

/// Drives the payment lifecycle of orders.
pub struct PaymentService<S: CommerceStore, P: PaymentProvider> {
    store: S,
    provider: P,
}

impl<S: CommerceStore, P: PaymentProvider> PaymentService<S, P> {
    /// Creates a payment service over the given store and provider.
    pub fn new(store: S, provider: P) -> Self {
        Self { store, provider }
    }

    /// Initiates an STK push for an order.
    ///
    /// The attempt is persisted only after the provider accepts; a
    /// rejected initiation leaves no trace.
    #[tracing::instrument(skip(self))]
    pub async fn initiate(
        &self,
        user: UserId,
        order: OrderId,
        phone_override: Option<String>,
    ) -> Result<PaymentIntent, PaymentError> {
        let order = self
            .store
            .find_order(user, order)
            .await?
            .ok_or(PaymentError::OrderNotFound)?;
        if order.payment_state == PaymentState::Completed {
            return Err(PaymentError::AlreadyPaid);
        }

        let phone =
            normalize_phone(&phone_override.unwrap_or_else(|| order.delivery.phone_number.clone()));
        let reference = order_reference(order.id);

        let response = self
            .provider
            .initiate(StkPushRequest {
                phone_number: phone.clone(),
                amount: order.total_amount,
                account_reference: reference.clone(),
                description: format!("Payment for {reference}"),
            })
            .await
            .map_err(|e| PaymentError::InitiationFailed(e.to_string()))?;

        let attempt = self
            .store
            .insert_payment(NewPaymentAttempt {
                order_id: order.id,
                transaction_id: response.transaction_id,
                checkout_request_id: response.checkout_request_id,
                merchant_request_id: response.merchant_request_id,
                phone_number: phone,
                amount: order.total_amount,
            })
            .await?;

        metrics::counter!("payments_initiated_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            checkout_request_id = %attempt.checkout_request_id,
            "payment initiated"
        );

        Ok(PaymentIntent {
            order_id: order.id,
            transaction_id: attempt.transaction_id,
            checkout_request_id: attempt.checkout_request_id,
            merchant_request_id: attempt.merchant_request_id,
            customer_message: response.customer_message,
        })
    }

    /// Applies a provider callback.
    ///
    /// Always returns a positive acknowledgement: the provider's retry
    /// channel only needs delivery confirmation, and internal failures
    /// are logged rather than surfaced. Re-delivery of an already-applied
    /// success is a no-op.
    #[tracing::instrument(skip(self, envelope), fields(checkout_request_id = %envelope.body.stk_callback.checkout_request_id))]
    pub async fn resolve_callback(&self, envelope: StkCallbackEnvelope) -> CallbackAck {
        let callback = &envelope.body.stk_callback;
        let update = if callback.is_success() {
            PaymentUpdate::Success {
                receipt: callback.receipt_number(),
            }
        } else {
            PaymentUpdate::Failure
        };

        match self
            .store
            .apply_payment_update(&callback.checkout_request_id, update)
            .await
        {
            Ok(CallbackApplication::Applied) => {
                metrics::counter!("payment_callbacks_applied_total").increment(1);
                tracing::info!(
                    result_code = callback.result_code,
                    "payment callback applied"
                );
            }
            Ok(CallbackApplication::AlreadyApplied) => {
                tracing::info!("payment callback re-delivered, already applied");
            }
            Ok(CallbackApplication::Unmatched) => {
                tracing::warn!("payment callback matched no attempt");
            }
            Err(e) => {
                tracing::error!(error = %e, "payment callback processing failed");
            }
        }

        CallbackAck::accepted()
    }

    /// Reports the order's payment status plus its latest attempt.
    #[tracing::instrument(skip(self))]
    pub async fn check_status(
        &self,
        user: UserId,
        order: OrderId,
    ) -> Result<PaymentStatusView, PaymentError> {
        let order = self
            .store
            .find_order(user, order)
            .await?
            .ok_or(PaymentError::OrderNotFound)?;
        let latest_attempt = self.store.latest_payment(order.id).await?;

        Ok(PaymentStatusView {
            order_id: order.id,
            order_status: order.status,
            payment_state: order.payment_state,
            latest_attempt,
        })
    }

    /// Marks an order paid without provider involvement.
    ///
    /// Ops/test escape hatch; the HTTP layer only exposes it when payment
    /// simulation is enabled in configuration.
    #[tracing::instrument(skip(self))]
    pub async fn simulate_success(
        &self,
        user: UserId,
        order: OrderId,
    ) -> Result<Order, PaymentError> {
        let receipt = simulated_receipt(order);
        self.store
            .force_payment_success(user, order, &receipt)
            .await?
            .ok_or(PaymentError::OrderNotFound)
    }
}

fn order_reference(order: OrderId) -> String {
    let hex = order.as_uuid().simple().to_string().to_uppercase();
    format!("ORDER-{}", &hex[..8])
}

fn simulated_receipt(order: OrderId) -> String {
    let hex = order.as_uuid().simple().to_string().to_uppercase();
    format!("MPESA{}TEST", &hex[..6])
}
