//! Order service REST API.
//!
//! # Architecture
//!
//! - [`ApiClient`] talks JSON over `reqwest` to `{base}/order/...`
//! - Every request carries the [`Session`](crate::session::Session) bearer
//!   token when one is held
//! - [`OrderBackend`] is the seam the store and controllers depend on, so
//!   tests can substitute an in-memory backend

pub mod client;
pub mod types;

use std::future::Future;

use street_admin_core::{Order, OrderId, OrderStatus, Page};

pub use client::ApiClient;

use crate::error::AppError;
use crate::orders::ListingQuery;

/// Remote capabilities the order store needs.
pub trait OrderBackend: Send + Sync + 'static {
    /// Fetch one page of orders matching `query`.
    fn list_orders(
        &self,
        query: &ListingQuery,
    ) -> impl Future<Output = Result<Page<Order>, AppError>> + Send;

    /// Fetch one order by identifier.
    fn get_order(&self, id: &OrderId) -> impl Future<Output = Result<Order, AppError>> + Send;

    /// Set an order's status and return the updated record.
    fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<Order, AppError>> + Send;
}
