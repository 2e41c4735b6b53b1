//! The payment provider contract.

use async_trait::async_trait;
use common::Money;
use thiserror::Error;

/// An STK push initiation request.
///
/// `phone_number` must already be normalized to international form.
#[derive(Debug, Clone)]
pub struct StkPushRequest {
    pub phone_number: String,
    pub amount: Money,
    pub account_reference: String,
    pub description: String,
}

/// Provider response to a successful initiation.
#[derive(Debug, Clone)]
pub struct StkPushResponse {
    pub merchant_request_id: String,
    /// Correlation id echoed back in the asynchronous callback.
    pub checkout_request_id: String,
    pub transaction_id: String,
    pub response_code: String,
    pub customer_message: String,
}

/// Provider response to an on-demand status query.
#[derive(Debug, Clone)]
pub struct StkQueryResponse {
    pub result_code: String,
    pub result_desc: String,
}

/// Errors returned by a payment provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider refused the request.
    #[error("provider rejected request: {0}")]
    Rejected(String),

    /// The provider could not be reached.
    #[error("provider unreachable: {0}")]
    Transport(String),
}

/// A mobile-money payment provider.
///
/// Implementations are injected into
/// [`PaymentService`](crate::PaymentService); there is no process-wide
/// provider instance.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Initiates an STK push on the customer's phone.
    async fn initiate(&self, request: StkPushRequest) -> Result<StkPushResponse, ProviderError>;

    /// Queries the status of a previously initiated push.
    ///
    /// Part of the provider contract; the reconciliation workflow is
    /// callback-driven and does not poll this.
    async fn query_status(
        &self,
        checkout_request_id: &str,
    ) -> Result<StkQueryResponse, ProviderError>;
}
