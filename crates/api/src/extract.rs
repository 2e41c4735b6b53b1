//! Caller identity extraction.
//!
//! Authentication itself lives upstream: the gateway verifies the session
//! and injects the caller's UUID as an `x-user-id` header. This extractor
//! only consumes that identity.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated caller's UUID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("missing caller identity".to_string()))?;
        let value = header
            .to_str()
            .map_err(|_| ApiError::Unauthorized("invalid caller identity".to_string()))?;
        let uuid = Uuid::parse_str(value)
            .map_err(|_| ApiError::Unauthorized("invalid caller identity".to_string()))?;
        Ok(Caller(UserId::from_uuid(uuid)))
    }
}
