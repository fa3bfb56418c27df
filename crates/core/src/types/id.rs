//! Newtype IDs for type-safe entity references.
//!
//! Internal row ids are `i32` wrappers created with [`define_id!`]; chat
//! platform identities are `i64` and use the dedicated [`ChatId`] type.

use serde::{Deserialize, Serialize};

/// Define a type-safe `i32` ID wrapper.
///
/// The generated type derives `Serialize`/`Deserialize` transparently and,
/// with the `postgres` feature, a transparent `sqlx::Type` so it binds and
/// decodes as a plain `INTEGER`.
#[macro_export]
macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw row id.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying row id.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Internal sequential order id (primary key of `orders`).
    OrderId
);

define_id!(
    /// Row id of a persisted relay message.
    StoredMessageId
);

/// Chat platform identity of a user (Telegram user/chat id).
///
/// Telegram ids exceed `i32`, so this is a distinct `i64` newtype rather
/// than a [`define_id!`] product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct ChatId(i64);

impl ChatId {
    /// Wrap a raw platform identity.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the underlying platform identity.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ChatId> for i64 {
    fn from(id: ChatId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_roundtrip() {
        let id = OrderId::new(42);
        assert_eq!(id.as_i32(), 42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(OrderId::from(42), id);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn chat_id_holds_telegram_scale_values() {
        let id = ChatId::new(5_000_000_001);
        assert_eq!(id.as_i64(), 5_000_000_001);
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&OrderId::new(7)).expect("serialize");
        assert_eq!(json, "7");
        let back: OrderId = serde_json::from_str("7").expect("deserialize");
        assert_eq!(back, OrderId::new(7));
    }
}
