//! Simulated M-Pesa provider.
//!
//! Stands in for the Daraja API in development and tests: accepts every
//! initiation (unless told to fail), fabricates the provider identifiers,
//! and never calls out anywhere.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::provider::{
    PaymentProvider, ProviderError, StkPushRequest, StkPushResponse, StkQueryResponse,
};

/// Sandbox provider configuration, read from the environment.
///
/// - `MPESA_BUSINESS_SHORTCODE` (default `"174379"`)
/// - `MPESA_PASSKEY` (default `"sandbox-passkey"`)
/// - `MPESA_CALLBACK_URL` (default `"http://localhost:3000/api/payments/mpesa/callback"`)
/// - `MPESA_ENVIRONMENT` (default `"sandbox"`)
#[derive(Debug, Clone)]
pub struct MpesaConfig {
    pub business_shortcode: String,
    pub passkey: String,
    pub callback_url: String,
    pub environment: String,
}

impl MpesaConfig {
    /// Loads configuration from environment variables, falling back to
    /// sandbox defaults.
    pub fn from_env() -> Self {
        Self {
            business_shortcode: std::env::var("MPESA_BUSINESS_SHORTCODE")
                .unwrap_or_else(|_| "174379".to_string()),
            passkey: std::env::var("MPESA_PASSKEY")
                .unwrap_or_else(|_| "sandbox-passkey".to_string()),
            callback_url: std::env::var("MPESA_CALLBACK_URL").unwrap_or_else(|_| {
                "http://localhost:3000/api/payments/mpesa/callback".to_string()
            }),
            environment: std::env::var("MPESA_ENVIRONMENT")
                .unwrap_or_else(|_| "sandbox".to_string()),
        }
    }
}

impl Default for MpesaConfig {
    fn default() -> Self {
        Self {
            business_shortcode: "174379".to_string(),
            passkey: "sandbox-passkey".to_string(),
            callback_url: "http://localhost:3000/api/payments/mpesa/callback".to_string(),
            environment: "sandbox".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct SandboxState {
    request_counter: u32,
    fail_next_initiate: bool,
}

/// Simulated [`PaymentProvider`].
#[derive(Clone)]
pub struct MpesaSandbox {
    config: MpesaConfig,
    state: Arc<Mutex<SandboxState>>,
}

impl MpesaSandbox {
    /// Creates a sandbox with the given configuration.
    pub fn new(config: MpesaConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(SandboxState::default())),
        }
    }

    /// The sandbox configuration.
    pub fn config(&self) -> &MpesaConfig {
        &self.config
    }

    /// Makes the next `initiate` call fail. Used by tests.
    pub async fn set_fail_next_initiate(&self, fail: bool) {
        self.state.lock().await.fail_next_initiate = fail;
    }
}

impl Default for MpesaSandbox {
    fn default() -> Self {
        Self::new(MpesaConfig::default())
    }
}

fn synth_transaction_id() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TXN{}", &hex[..10])
}

#[async_trait]
impl PaymentProvider for MpesaSandbox {
    async fn initiate(&self, request: StkPushRequest) -> Result<StkPushResponse, ProviderError> {
        let mut state = self.state.lock().await;
        if state.fail_next_initiate {
            state.fail_next_initiate = false;
            return Err(ProviderError::Rejected(
                "request declined by sandbox".to_string(),
            ));
        }

        state.request_counter += 1;
        let counter = state.request_counter;
        drop(state);

        tracing::debug!(
            shortcode = %self.config.business_shortcode,
            phone = %request.phone_number,
            amount = %request.amount,
            reference = %request.account_reference,
            "sandbox STK push accepted"
        );

        Ok(StkPushResponse {
            merchant_request_id: format!("MR{counter:05}"),
            checkout_request_id: format!(
                "ws_CO_{}_{counter:04}",
                Utc::now().format("%Y%m%d%H%M%S")
            ),
            transaction_id: synth_transaction_id(),
            response_code: "0".to_string(),
            customer_message: "Success. Request accepted for processing".to_string(),
        })
    }

    async fn query_status(
        &self,
        checkout_request_id: &str,
    ) -> Result<StkQueryResponse, ProviderError> {
        tracing::debug!(%checkout_request_id, "sandbox STK query");
        Ok(StkQueryResponse {
            result_code: "0".to_string(),
            result_desc: "The service request is processed successfully.".to_string(),
        })
    }
}
