//! UUID-backed identifier newtypes.
//!
//! Each entity gets its own id type so a `ProductId` can never be passed
//! where an `OrderId` is expected. All of them serialize transparently as
//! plain UUIDs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Identity of an authenticated caller, issued by the upstream gateway.
    UserId
}

uuid_id! {
    /// Identifier for a product category.
    CategoryId
}

uuid_id! {
    /// Identifier for a catalog product.
    ProductId
}

uuid_id! {
    /// Identifier for a user's cart.
    CartId
}

uuid_id! {
    /// Identifier for a cart or order line item.
    LineId
}

uuid_id! {
    /// Identifier for a durable order.
    OrderId
}

uuid_id! {
    /// Identifier for a payment attempt.
    PaymentId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(OrderId::new(), OrderId::new());
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        assert_eq!(ProductId::from_uuid(uuid).as_uuid(), uuid);
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let id = CartId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));

        let back: CartId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ordering_follows_uuid_bytes() {
        let a = PaymentId::from_uuid(Uuid::from_u128(1));
        let b = PaymentId::from_uuid(Uuid::from_u128(2));
        assert!(a < b);
    }
}
