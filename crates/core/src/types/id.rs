//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_str_id!` macro to create type-safe wrappers around the
//! string identifiers that flow through the cart protocol. Keeping catalog
//! product ids and user ids in distinct types prevents accidentally mixing
//! them, and keeps both clearly separate from [`CartRowId`], the
//! server-issued integer key of a persisted cart row.

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use axle_core::define_str_id;
/// define_str_id!(SkuId);
///
/// let sku = SkuId::new("BRK-PAD-2041");
/// assert_eq!(sku.as_str(), "BRK-PAD-2041");
/// ```
#[macro_export]
macro_rules! define_str_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID, returning the underlying `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

define_str_id!(ProductId);
define_str_id!(UserId);

/// Server-issued identifier of a persisted cart row.
///
/// Only the cart service hands these out (MySQL autoincrement key). A cart
/// line that has never been persisted remotely has no `CartRowId`; conflating
/// this id space with [`ProductId`] is exactly the bug class the newtypes
/// exist to prevent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartRowId(i64);

impl CartRowId {
    /// Create a new row ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the underlying i64 value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CartRowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CartRowId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<CartRowId> for i64 {
    fn from(id: CartRowId) -> Self {
        id.0
    }
}
