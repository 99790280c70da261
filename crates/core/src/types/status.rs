//! Status enums for marketplace entities.
//!
//! All of these are parsed leniently from backend strings: casing, dashes
//! and spaces are ignored, and unknown values map to a designated fallback
//! instead of failing the whole page.

use serde::{Deserialize, Serialize};

/// Normalize a backend status string to `snake_case` for matching.
fn status_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    /// Every status, in lifecycle order (used to render status pickers).
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Returned,
    ];

    /// Parse a backend status string. Unknown values map to `Pending`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match status_key(raw).as_str() {
            "confirmed" | "placed" | "accepted" => Self::Confirmed,
            "processing" | "packed" => Self::Processing,
            "shipped" | "dispatched" | "in_transit" | "out_for_delivery" => Self::Shipped,
            "delivered" | "completed" => Self::Delivered,
            "cancelled" | "canceled" => Self::Cancelled,
            "returned" | "refunded" => Self::Returned,
            _ => Self::Pending,
        }
    }

    /// Backend spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Returned => "returned",
        }
    }

    /// Whether the order can still change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Returned)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    /// Parse a backend payment status. Unknown values map to `Pending`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match status_key(raw).as_str() {
            "paid" | "success" | "captured" | "completed" => Self::Paid,
            "failed" | "failure" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            _ => Self::Pending,
        }
    }

    /// Backend spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the shopper pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery: the order is complete once placed.
    #[default]
    Cod,
    /// Online payment through the payment gateway widget.
    Online,
}

impl PaymentMethod {
    /// Parse a form or backend value. Unknown values map to `Cod`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match status_key(raw).as_str() {
            "online" | "razorpay" | "card" | "upi" | "prepaid" => Self::Online,
            _ => Self::Cod,
        }
    }

    /// Backend spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "COD",
            Self::Online => "ONLINE",
        }
    }

    /// Label shown to shoppers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cod => "Cash on delivery",
            Self::Online => "Pay online (cards, UPI, netbanking)",
        }
    }
}

/// Whether a user account may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Blocked,
}

impl AccountStatus {
    /// Parse a backend value. Also understands boolean-ish `isBlocked` spellings.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match status_key(raw).as_str() {
            "blocked" | "suspended" | "banned" | "inactive" | "true" => Self::Blocked,
            _ => Self::Active,
        }
    }

    /// Backend spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
        }
    }

    /// The opposite status (for block/unblock toggles).
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Blocked,
            Self::Blocked => Self::Active,
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderation state of a seller or product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Parse a backend value. Unknown values map to `Pending`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match status_key(raw).as_str() {
            "approved" | "active" | "verified" | "published" | "true" => Self::Approved,
            "rejected" | "declined" | "inactive" | "removed" => Self::Rejected,
            _ => Self::Pending,
        }
    }

    /// Backend spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_aliases() {
        assert_eq!(OrderStatus::parse_lenient("Out for delivery"), OrderStatus::Shipped);
        assert_eq!(OrderStatus::parse_lenient("CANCELED"), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::parse_lenient("in-transit"), OrderStatus::Shipped);
        assert_eq!(OrderStatus::parse_lenient(""), OrderStatus::Pending);
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!(PaymentMethod::parse_lenient("razorpay"), PaymentMethod::Online);
        assert_eq!(PaymentMethod::parse_lenient("COD"), PaymentMethod::Cod);
        assert_eq!(PaymentMethod::Online.as_str(), "ONLINE");
    }

    #[test]
    fn test_account_status_toggle() {
        assert_eq!(AccountStatus::parse_lenient("true"), AccountStatus::Blocked);
        assert_eq!(AccountStatus::Blocked.toggled(), AccountStatus::Active);
    }

    #[test]
    fn test_approval_status_parse() {
        assert_eq!(ApprovalStatus::parse_lenient("Verified"), ApprovalStatus::Approved);
        assert_eq!(ApprovalStatus::parse_lenient("declined"), ApprovalStatus::Rejected);
        assert_eq!(ApprovalStatus::parse_lenient("?"), ApprovalStatus::Pending);
    }
}
