//! Integration tests for the Women's Street admin tooling.
//!
//! Every test drives a full [`AppState`] against a `wiremock` stand-in for
//! the order service, so nothing external needs to be running.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p street-admin-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `orders_api` - endpoints, auth header and error mapping
//! - `status_flow` - status transitions and cache coherence
//! - `listing_flow` - pagination, filters and debounced search
//! - `receipt_flow` - receipt generation and saving

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::SecretString;
use serde_json::{Value, json};
use street_admin::AppState;
use street_admin::config::AdminConfig;
use street_admin::notify::{MemoryNotifier, Notification};
use street_admin::session::Session;
use tempfile::TempDir;
use wiremock::MockServer;

/// Bearer token every test session carries.
pub const TEST_TOKEN: &str = "integration-t0ken";

/// Mock order service plus the state under test.
pub struct TestContext {
    pub server: MockServer,
    pub state: AppState,
    pub notifier: Arc<MemoryNotifier>,
    pub receipt_dir: TempDir,
}

impl TestContext {
    /// Context with default settings.
    pub async fn new() -> Self {
        Self::with_vars(&[]).await
    }

    /// Context with extra `ADMIN_*` variables layered over the defaults.
    pub async fn with_vars(extra: &[(&str, &str)]) -> Self {
        let server = MockServer::start().await;
        let receipt_dir = tempfile::tempdir().unwrap();

        let mut vars: HashMap<String, String> = HashMap::from([
            ("ADMIN_API_BASE_URL".to_string(), format!("{}/api/v1", server.uri())),
            (
                "ADMIN_RECEIPT_DIR".to_string(),
                receipt_dir.path().display().to_string(),
            ),
            ("ADMIN_RECEIPT_SETTLE_MS".to_string(), "0".to_string()),
        ]);
        for (key, value) in extra {
            vars.insert((*key).to_string(), (*value).to_string());
        }
        let config = AdminConfig::from_vars(|key| vars.get(key).cloned()).unwrap();

        let notifier = Arc::new(MemoryNotifier::new());
        let state = AppState::new(
            config,
            Session::with_token(SecretString::from(TEST_TOKEN)),
            Arc::clone(&notifier) as Arc<dyn street_admin::notify::Notifier>,
        )
        .unwrap();

        Self {
            server,
            state,
            notifier,
            receipt_dir,
        }
    }

    /// Path of an order-service endpoint as mounted on the mock server.
    #[must_use]
    pub fn api_path(suffix: &str) -> String {
        format!("/api/v1/order/{suffix}")
    }

    /// Most recent notification, panicking if there is none.
    #[must_use]
    pub fn last_notification(&self) -> Notification {
        self.notifier.last().unwrap()
    }
}

/// Wire JSON for an order of two Tote Bags (2500 each), 150 shipping, 50 tax.
#[must_use]
pub fn order_json(id: &str, number: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "guestId": "guest-42",
        "orderNumber": number,
        "items": [
            {"productId": "p-tote", "name": "Tote Bag", "price": 2500, "quantity": 2, "image": "https://cdn.example.com/tote.jpg"}
        ],
        "customerDetails": {
            "name": "Sana Malik",
            "email": "sana@example.com",
            "phone": "0321-7654321",
            "address": "House 7, Street 3, F-7/2",
            "nearbyPlace": "Jinnah Super",
            "city": "Islamabad",
            "postalCode": "44000",
            "notes": "Call before delivery"
        },
        "totalAmount": 5000,
        "totalItems": 2,
        "shippingCost": 150,
        "tax": 50,
        "finalTotal": 5200,
        "paymentMethod": "Cash on Delivery",
        "status": status,
        "createdAt": "2024-08-01T09:30:00Z",
        "updatedAt": "2024-08-01T09:30:00Z"
    })
}

/// `GET /order/admin/all` style body.
#[must_use]
pub fn orders_body(orders: Vec<Value>, page: u32, pages: u32, total: u64) -> Value {
    json!({
        "message": "Orders fetched successfully",
        "status": 200,
        "orders": orders,
        "pagination": {"page": page, "limit": 10, "total": total, "pages": pages}
    })
}

/// Single-order body.
#[must_use]
pub fn order_body(order: Value) -> Value {
    json!({
        "message": "Order fetched successfully",
        "status": 200,
        "order": order
    })
}
