//! Session-scoped models for the storefront.

pub mod flash;
pub mod session;

pub use flash::{Flash, FlashKind};
pub use session::{UserSession, keys as session_keys};
