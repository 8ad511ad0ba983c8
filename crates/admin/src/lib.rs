//! Street Admin library.
//!
//! Order management for the Women's Street admin panel, usable from any
//! front end (the `street-cli` binary is one).
//!
//! # Architecture
//!
//! - [`api`] - REST client for the order service
//! - [`store`] - read-through order cache shared by the controllers
//! - [`orders`] - listing/filter controller and status transition controller
//! - [`receipt`] - receipt document, layout, rasterization and saving
//! - [`session`] - bearer token owned for the whole process
//! - [`notify`] - success/error notifications shown to the operator
//!
//! # Security
//!
//! The session token grants admin access to every order. It is only held in
//! a [`secrecy::SecretString`], never logged, and persisted with owner-only
//! permissions.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod notify;
pub mod orders;
pub mod receipt;
pub mod session;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::AppError;
pub use state::AppState;
