//! Test fixtures shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::TimeDelta;
use street_admin_core::{Order, OrderId, OrderStatus, Page, Pagination};

use crate::api::OrderBackend;
use crate::error::AppError;
use crate::orders::ListingQuery;

/// Wire JSON for a single-item order (Tote Bag, 2500 × 1, no shipping or tax).
pub fn order_json(id: &str, number: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "guestId": "guest-1",
        "orderNumber": number,
        "items": [
            {"productId": "p1", "name": "Tote Bag", "price": 2500, "quantity": 1, "image": ""}
        ],
        "customerDetails": {
            "name": "Ayesha Khan",
            "email": "ayesha@example.com",
            "phone": "0300-1234567",
            "address": "12 Mall Road",
            "nearbyPlace": "Liberty Market",
            "city": "Lahore",
            "postalCode": "54000"
        },
        "totalAmount": 2500,
        "totalItems": 1,
        "shippingCost": 0,
        "tax": 0,
        "finalTotal": 2500,
        "paymentMethod": "Cash on Delivery",
        "status": status,
        "createdAt": "2024-07-24T10:15:00Z",
        "updatedAt": "2024-07-24T10:15:00Z"
    })
}

pub fn order(id: &str, number: &str, status: OrderStatus) -> Order {
    serde_json::from_value(order_json(id, number, status.as_str())).unwrap()
}

/// In-memory [`OrderBackend`] with call counters and failure switches.
#[derive(Default)]
pub struct FakeBackend {
    orders: Mutex<Vec<Order>>,
    queries: Mutex<Vec<ListingQuery>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    response_delay: Mutex<Option<Duration>>,
    update_delay: Mutex<Option<Duration>>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    update_calls: AtomicUsize,
    fail_lists: AtomicBool,
    fail_updates: AtomicBool,
    keep_updated_at: AtomicBool,
}

impl FakeBackend {
    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: Mutex::new(orders),
            ..Self::default()
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<ListingQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Listing requests searching for `term` take `delay` to answer.
    pub fn delay_search(&self, term: &str, delay: Duration) {
        self.search_delays
            .lock()
            .unwrap()
            .insert(term.to_string(), delay);
    }

    /// Listing requests read the orders immediately but answer after `delay`.
    pub fn delay_list_responses(&self, delay: Duration) {
        *self.response_delay.lock().unwrap() = Some(delay);
    }

    /// Status updates take `delay` before they are applied.
    pub fn delay_updates(&self, delay: Duration) {
        *self.update_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Answer updates without advancing `updatedAt`.
    pub fn keep_updated_at(&self, keep: bool) {
        self.keep_updated_at.store(keep, Ordering::SeqCst);
    }

    pub fn stored(&self, id: &str) -> Option<Order> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id.as_str() == id)
            .cloned()
    }
}

fn matches(order: &Order, query: &ListingQuery) -> bool {
    if query.status().is_some_and(|status| order.status != status) {
        return false;
    }
    query.search().is_none_or(|term| {
        let term = term.to_lowercase();
        order.order_number.to_lowercase().contains(&term)
            || order.customer_details.name.to_lowercase().contains(&term)
    })
}

impl OrderBackend for FakeBackend {
    async fn list_orders(&self, query: &ListingQuery) -> Result<Page<Order>, AppError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        let delay = self
            .search_delays
            .lock()
            .unwrap()
            .get(query.search().unwrap_or_default())
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(AppError::Api {
                status: 500,
                message: "listing unavailable".to_string(),
            });
        }

        let matching: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| matches(o, query))
            .cloned()
            .collect();

        let response_delay = *self.response_delay.lock().unwrap();
        if let Some(delay) = response_delay {
            tokio::time::sleep(delay).await;
        }

        let total = matching.len();
        let limit = query.limit() as usize;
        let records = matching
            .into_iter()
            .skip((query.page() as usize - 1) * limit)
            .take(limit)
            .collect();

        Ok(Page {
            records,
            pagination: Pagination {
                page: query.page(),
                limit: query.limit(),
                total: total as u64,
                pages: u32::try_from(total.div_ceil(limit)).unwrap().max(1),
            },
        })
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, AppError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.stored(id.as_str())
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))
    }

    async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, AppError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.update_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Api {
                status: 500,
                message: "update failed".to_string(),
            });
        }

        let keep = self.keep_updated_at.load(Ordering::SeqCst);
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| o.id == *id)
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

        order.status = status;
        if !keep {
            order.updated_at = order.updated_at.map(|at| at + TimeDelta::hours(1));
        }
        Ok(order.clone())
    }
}
