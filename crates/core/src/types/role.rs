//! Marketplace account roles.

use serde::{Deserialize, Serialize};

/// Role of a signed-in account.
///
/// The backend is inconsistent about role spellings, so [`Role::parse_lenient`]
/// folds the known aliases onto the three roles the storefront gates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shopper: browse, cart, wishlist, checkout.
    #[default]
    Consumer,
    /// Merchant managing their own products and orders.
    Seller,
    /// Marketplace operator with moderation rights.
    Admin,
}

impl Role {
    /// Map a backend role string onto a [`Role`].
    ///
    /// Unknown values fall back to [`Role::Consumer`], the least privileged role.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "seller" | "vendor" | "merchant" => Self::Seller,
            "admin" | "superadmin" | "super_admin" | "administrator" => Self::Admin,
            _ => Self::Consumer,
        }
    }

    /// Path of the role's landing page after login.
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::Consumer => "/",
            Self::Seller => "/seller",
            Self::Admin => "/admin",
        }
    }

    /// Value sent to the backend when registering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Consumer => "user",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Consumer => write!(f, "consumer"),
            Self::Seller => write!(f, "seller"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_aliases() {
        assert_eq!(Role::parse_lenient("USER"), Role::Consumer);
        assert_eq!(Role::parse_lenient("customer"), Role::Consumer);
        assert_eq!(Role::parse_lenient(" Vendor "), Role::Seller);
        assert_eq!(Role::parse_lenient("superadmin"), Role::Admin);
        assert_eq!(Role::parse_lenient("something-new"), Role::Consumer);
    }

    #[test]
    fn test_home_path() {
        assert_eq!(Role::Seller.home_path(), "/seller");
        assert_eq!(Role::Admin.home_path(), "/admin");
        assert_eq!(Role::Consumer.home_path(), "/");
    }
}
