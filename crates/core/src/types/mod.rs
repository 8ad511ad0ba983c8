//! Core types for the order admin.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod order;
pub mod price;
pub mod status;

pub use id::*;
pub use order::{CustomerDetails, Order, OrderItem, Page, Pagination};
pub use price::{CurrencyCode, Price};
pub use status::*;
