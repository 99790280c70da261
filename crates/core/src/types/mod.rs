//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common marketplace concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod status;
pub mod totals;

pub use address::{AddressError, ShippingAddress};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use role::Role;
pub use status::*;
pub use totals::{OrderTotals, PricingRules};
