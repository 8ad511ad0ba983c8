//! Display formatting for prices and timestamps.
//!
//! Timestamps are rendered in UTC.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use street_admin_core::Price;

/// Format a rupee amount, e.g. `Rs 2,500.00`.
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    Price::pkr(amount).display()
}

/// Calendar date, e.g. `Jul 24, 2024`; blank when unknown.
#[must_use]
pub fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Date with time of day, e.g. `Jul 24, 2024, 10:15 AM`; blank when unknown.
#[must_use]
pub fn format_datetime(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%b %-d, %Y, %I:%M %p").to_string())
        .unwrap_or_default()
}

/// Full timestamp, e.g. `7/24/2024, 10:15:00 AM`.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
