//! Street Admin Core - Shared order domain types.
//!
//! This crate provides the types used across the admin tooling:
//! - `admin` - Order management library (REST client, controllers, receipts)
//! - `cli` - Command-line front end for order management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. The order status state machine lives here so every consumer
//! enforces the same transition table.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, order records and the status machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
