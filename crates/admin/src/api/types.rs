//! Wire types for the order service.
//!
//! Responses wrap their payload with a `message` and a numeric `status`;
//! only the payload is kept.

use serde::{Deserialize, Serialize};
use street_admin_core::{Order, OrderStatus, Page, Pagination};

/// `GET /order/admin/all` and `GET /order/{guestId}/orders`.
#[derive(Debug, Deserialize)]
pub struct OrdersResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl From<OrdersResponse> for Page<Order> {
    fn from(response: OrdersResponse) -> Self {
        Self {
            records: response.orders,
            pagination: response.pagination,
        }
    }
}

/// Single-order responses.
#[derive(Debug, Deserialize)]
pub struct SingleOrderResponse {
    #[serde(default)]
    pub message: String,
    pub order: Order,
}

/// `PUT /order/admin/{id}/status` body.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Error body returned on failure.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Best available message.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.is_empty())
    }
}
