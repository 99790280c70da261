//! Bazaar Core - Shared domain types.
//!
//! This crate provides the types shared by the Bazaar components:
//! - `storefront` - Server-rendered marketplace (consumer, seller and admin views)
//! - `cli` - Command-line tools for migrations and backend checks
//!
//! # Architecture
//!
//! The marketplace backend owns every entity. The core crate only holds the
//! storefront's validated, I/O-free view of them: identifiers, money, roles,
//! statuses, shipping addresses and the order-total arithmetic used by the
//! checkout draft.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, roles, statuses, addresses and totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
