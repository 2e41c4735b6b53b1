//! Persisted status enums and their text codecs.
//!
//! Statuses are stored as lowercase text columns; `parse` is the single
//! place a column value becomes an enum, so a bad row surfaces as
//! [`StoreError::Corrupt`](crate::StoreError::Corrupt) at the decode site.

use serde::{Deserialize, Serialize};

/// Fulfillment state of an order.
///
/// Payment only ever drives the `Pending → Processing` edge; the later
/// stages belong to fulfillment tooling outside this backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order created, payment not yet confirmed.
    #[default]
    Pending,
    /// Payment confirmed, order being prepared.
    Processing,
    /// Order handed to the courier.
    Shipped,
    /// Order delivered to the customer.
    Delivered,
    /// Order cancelled.
    Cancelled,
}

impl OrderStatus {
    /// The column text for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a column value; `None` for unknown text.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state of an order as a whole.
///
/// `Pending → Completed` is terminal; `Pending → Failed` is not — a new
/// attempt returns the order to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    /// Awaiting provider confirmation.
    #[default]
    Pending,
    /// Provider confirmed payment.
    Completed,
    /// The most recent attempt failed.
    Failed,
}

impl PaymentState {
    /// The column text for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
        }
    }

    /// Parses a column value; `None` for unknown text.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentState::Pending),
            "completed" => Some(PaymentState::Completed),
            "failed" => Some(PaymentState::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a single payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    /// Sent to the provider, awaiting callback.
    #[default]
    Pending,
    /// Provider confirmed this attempt.
    Success,
    /// Provider rejected or the customer cancelled.
    Failed,
}

impl AttemptStatus {
    /// The column text for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Pending => "pending",
            AttemptStatus::Success => "success",
            AttemptStatus::Failed => "failed",
        }
    }

    /// Parses a column value; `None` for unknown text.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(AttemptStatus::Pending),
            "success" => Some(AttemptStatus::Success),
            "failed" => Some(AttemptStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// M-Pesa STK push.
    #[default]
    Mpesa,
}

impl PaymentMethod {
    /// The column text for this method.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Mpesa => "mpesa",
        }
    }

    /// Parses a column value; `None` for unknown text.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mpesa" => Some(PaymentMethod::Mpesa),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_round_trips_through_text() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("refunded"), None);
    }

    #[test]
    fn payment_state_round_trips_through_text() {
        for state in [
            PaymentState::Pending,
            PaymentState::Completed,
            PaymentState::Failed,
        ] {
            assert_eq!(PaymentState::parse(state.as_str()), Some(state));
        }
        assert_eq!(PaymentState::parse(""), None);
    }

    #[test]
    fn attempt_status_round_trips_through_text() {
        for status in [
            AttemptStatus::Pending,
            AttemptStatus::Success,
            AttemptStatus::Failed,
        ] {
            assert_eq!(AttemptStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn defaults_are_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentState::default(), PaymentState::Pending);
        assert_eq!(AttemptStatus::default(), AttemptStatus::Pending);
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Mpesa).unwrap(),
            "\"mpesa\""
        );
    }
}
