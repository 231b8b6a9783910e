//! Shared value types.

pub mod currency;
pub mod serde_helpers;

pub use currency::Currency;
