//! Delivery information validation.

use serde::Deserialize;
use store::DeliveryInfo;

use crate::error::DomainError;

/// Unvalidated delivery details as supplied by the client.
///
/// Every field is optional at the wire level so that validation can name
/// the first missing field instead of failing opaquely at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryDraft {
    pub phone_number: Option<String>,
    pub full_name: Option<String>,
    pub county: Option<String>,
    pub town: Option<String>,
    pub address: Option<String>,
}

impl DeliveryDraft {
    /// Validates the draft, producing [`DeliveryInfo`].
    ///
    /// Fields are checked in a fixed order; the error names the first one
    /// that is missing or blank.
    pub fn validate(self) -> Result<DeliveryInfo, DomainError> {
        Ok(DeliveryInfo {
            phone_number: required(self.phone_number, "phone_number")?,
            full_name: required(self.full_name, "full_name")?,
            county: required(self.county, "county")?,
            town: required(self.town, "town")?,
            address: required(self.address, "address")?,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, DomainError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DomainError::Validation { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_draft() -> DeliveryDraft {
        DeliveryDraft {
            phone_number: Some("0712345678".into()),
            full_name: Some("Wanjiku Kamau".into()),
            county: Some("Nairobi".into()),
            town: Some("Westlands".into()),
            address: Some("Mpaka Rd 12".into()),
        }
    }

    #[test]
    fn complete_draft_validates() {
        let info = full_draft().validate().unwrap();
        assert_eq!(info.phone_number, "0712345678");
        assert_eq!(info.county, "Nairobi");
    }

    #[test]
    fn names_the_first_missing_field() {
        let mut draft = full_draft();
        draft.full_name = None;
        draft.town = None;
        match draft.validate() {
            Err(DomainError::Validation { field }) => assert_eq!(field, "full_name"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn blank_counts_as_missing() {
        let mut draft = full_draft();
        draft.address = Some("   ".into());
        match draft.validate() {
            Err(DomainError::Validation { field }) => assert_eq!(field, "address"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
