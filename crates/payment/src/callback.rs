//! STK callback payload and acknowledgement types.
//!
//! The provider posts a nested JSON document; field names follow its wire
//! format, hence the PascalCase renames.

use serde::{Deserialize, Serialize};

/// The outer callback document: `{"Body": {"stkCallback": {...}}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: CallbackBody,
}

/// The `Body` wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

/// The callback proper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    /// Correlation key: matches the `checkout_request_id` stored on the
    /// attempt at initiation.
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    /// Present only on success.
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

/// Metadata item list carried on successful callbacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub items: Vec<MetadataItem>,
}

/// One `{Name, Value}` metadata entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<serde_json::Value>,
}

impl StkCallback {
    /// True when the provider reports success (`ResultCode == 0`).
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    fn metadata_value(&self, name: &str) -> Option<&serde_json::Value> {
        self.callback_metadata
            .as_ref()?
            .items
            .iter()
            .find(|item| item.name == name)?
            .value
            .as_ref()
    }

    /// The provider receipt number, when present.
    pub fn receipt_number(&self) -> Option<String> {
        self.metadata_value("MpesaReceiptNumber")
            .map(value_to_string)
    }

    /// The confirmed amount in whole shillings, when present.
    pub fn amount(&self) -> Option<i64> {
        self.metadata_value("Amount").and_then(|v| v.as_i64())
    }

    /// The paying phone number, when present.
    pub fn phone_number(&self) -> Option<String> {
        self.metadata_value("PhoneNumber").map(value_to_string)
    }
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Acknowledgement returned to the provider.
///
/// Always carries `ResultCode` 0, including on internal processing
/// failure — the provider only needs to know the callback was received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackAck {
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl CallbackAck {
    /// The standard acceptance acknowledgement.
    pub fn accepted() -> Self {
        Self {
            result_code: 0,
            result_desc: "Accepted".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success_payload() -> serde_json::Value {
        serde_json::json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "MR00001",
                    "CheckoutRequestID": "ws_CO_20250101120000_0001",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            {"Name": "Amount", "Value": 5100},
                            {"Name": "MpesaReceiptNumber", "Value": "QHX12ABC9K"},
                            {"Name": "TransactionDate", "Value": 20250101120530i64},
                            {"Name": "PhoneNumber", "Value": 254712345678i64}
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn parses_success_payload() {
        let envelope: StkCallbackEnvelope =
            serde_json::from_value(success_payload()).unwrap();
        let cb = &envelope.body.stk_callback;

        assert!(cb.is_success());
        assert_eq!(cb.checkout_request_id, "ws_CO_20250101120000_0001");
        assert_eq!(cb.receipt_number().as_deref(), Some("QHX12ABC9K"));
        assert_eq!(cb.amount(), Some(5100));
        assert_eq!(cb.phone_number().as_deref(), Some("254712345678"));
    }

    #[test]
    fn parses_failure_payload_without_metadata() {
        let envelope: StkCallbackEnvelope = serde_json::from_value(serde_json::json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "MR00002",
                    "CheckoutRequestID": "ws_CO_20250101120000_0002",
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user"
                }
            }
        }))
        .unwrap();
        let cb = &envelope.body.stk_callback;

        assert!(!cb.is_success());
        assert_eq!(cb.receipt_number(), None);
        assert_eq!(cb.amount(), None);
    }

    #[test]
    fn ack_serializes_with_provider_field_names() {
        let json = serde_json::to_value(CallbackAck::accepted()).unwrap();
        assert_eq!(json["ResultCode"], 0);
        assert_eq!(json["ResultDesc"], "Accepted");
    }
}
