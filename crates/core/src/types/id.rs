//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. The backend issues
//! opaque string identifiers, so every ID wraps a `String`.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use street_admin_core::define_id;
/// define_id!(CouponId);
/// define_id!(ShipmentId);
///
/// let coupon = CouponId::new("65f1c0ffee");
/// let shipment = ShipmentId::new("65f1c0ffee");
///
/// // These are different types, so this won't compile:
/// // let _: CouponId = shipment;
/// assert_eq!(coupon.as_str(), shipment.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
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

            /// Whether the ID is empty (never issued by the backend).
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
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

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self(String::new())
            }
        }
    };
}

// Define standard entity IDs
define_id!(OrderId);
define_id!(GuestId);
define_id!(ProductId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_matches_inner() {
        let id = OrderId::new("66a0b1c2d3e4f5a6b7c8d9e0");
        assert_eq!(id.to_string(), "66a0b1c2d3e4f5a6b7c8d9e0");
        assert_eq!(id.as_str(), "66a0b1c2d3e4f5a6b7c8d9e0");
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = GuestId::from("guest-42");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"guest-42\"");

        let parsed: Result<GuestId, _> = serde_json::from_str("\"guest-42\"");
        assert!(matches!(parsed, Ok(ref g) if g == &id));
    }

    #[test]
    fn test_default_id_is_empty() {
        assert!(ProductId::default().is_empty());
        assert!(!ProductId::new("p1").is_empty());
    }
}
