//! Order records as mirrored from the order service.
//!
//! Every field except the id defaults when absent on the wire (text to empty,
//! timestamps to `None`) so a partially populated record still deserializes
//! and renders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{GuestId, OrderId, ProductId};
use super::price::Price;
use super::status::OrderStatus;

/// Allowed drift between `final_total` and its components.
pub const TOTAL_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// One customer purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub guest_id: GuestId,
    #[serde(default)]
    pub order_number: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub customer_details: CustomerDetails,
    /// Sum of line subtotals, before shipping and tax.
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub final_total: Decimal,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Bumped on every status change.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// `total_amount + shipping_cost + tax`.
    #[must_use]
    pub fn computed_final_total(&self) -> Decimal {
        self.total_amount + self.shipping_cost + self.tax
    }

    /// Whether `final_total` agrees with its components within [`TOTAL_TOLERANCE`].
    #[must_use]
    pub fn totals_consistent(&self) -> bool {
        (self.final_total - self.computed_final_total()).abs() <= TOTAL_TOLERANCE
    }

    /// Sum of `price * quantity` across all line items.
    #[must_use]
    pub fn items_subtotal(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Sum of quantities across all line items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Final total as a displayable price.
    #[must_use]
    pub const fn final_price(&self) -> Price {
        Price::pkr(self.final_total)
    }

    /// Apply a status change, bumping `updated_at` to `now`.
    pub fn apply_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = Some(now);
    }
}

/// A purchased product line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    /// Unit price.
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub quantity: u32,
    /// Product image URL.
    #[serde(default)]
    pub image: String,
}

impl OrderItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Contact and delivery details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// Landmark used by couriers.
    pub nearby_place: String,
    pub city: String,
    pub postal_code: String,
    /// Special delivery instructions.
    pub notes: Option<String>,
}

impl CustomerDetails {
    /// Notes, if present and not blank.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
    }
}

/// Pagination metadata returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            total: 0,
            pages: 1,
        }
    }
}

/// One page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Total pages, never less than one.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.pagination.pages.max(1)
    }
}
