//! Receipt document tree.
//!
//! [`build_receipt`] is pure: the same order and the same `now` always
//! produce the same document.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use street_admin_core::Order;

use crate::format::{format_date, format_price, format_timestamp};

pub const STORE_NAME: &str = "Women's Street";
pub const STORE_TAGLINE: &str = "Elegant Fashion Store";

/// Ordered blocks making up one receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptDocument {
    pub blocks: Vec<Block>,
}

/// One visual block of the receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Header {
        title: String,
        tagline: String,
        subtitle: String,
    },
    Section {
        title: String,
        style: RowStyle,
        rows: Vec<Row>,
    },
    Items {
        title: String,
        lines: Vec<ItemLine>,
    },
    Summary {
        title: String,
        rows: Vec<Row>,
        total: Row,
    },
    Footer {
        lines: Vec<String>,
        meta: Vec<String>,
    },
}

/// How a section's rows are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    /// Label on the left, value on the right.
    Inline,
    /// Label above value.
    Stacked,
}

/// Label/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: String,
    pub value: String,
    pub emphasis: bool,
}

impl Row {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            emphasis: false,
        }
    }

    fn emphasized(label: &str, value: impl Into<String>) -> Self {
        Self {
            emphasis: true,
            ..Self::new(label, value)
        }
    }
}

/// One purchased product as printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLine {
    pub name: String,
    pub quantity: String,
    pub unit_price: String,
    pub subtotal: String,
}

impl ReceiptDocument {
    /// Rows of the section titled `title`.
    #[must_use]
    pub fn section(&self, title: &str) -> Option<&[Row]> {
        self.blocks.iter().find_map(|block| match block {
            Block::Section { title: t, rows, .. } if t == title => Some(rows.as_slice()),
            _ => None,
        })
    }

    /// Summary rows followed by the total row.
    #[must_use]
    pub fn summary(&self) -> Vec<&Row> {
        self.blocks
            .iter()
            .find_map(|block| match block {
                Block::Summary { rows, total, .. } => {
                    Some(rows.iter().chain(std::iter::once(total)).collect())
                }
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Printed item lines.
    #[must_use]
    pub fn items(&self) -> &[ItemLine] {
        self.blocks
            .iter()
            .find_map(|block| match block {
                Block::Items { lines, .. } => Some(lines.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Assemble the receipt for `order`, stamped as generated at `now`.
#[must_use]
pub fn build_receipt(order: &Order, now: DateTime<Utc>) -> ReceiptDocument {
    let customer = &order.customer_details;

    let order_info = vec![
        Row::emphasized("Order ID:", format!("#{}", order.order_number)),
        Row::new("Order Date:", format_date(order.created_at)),
        Row::emphasized("Status:", order.status.label()),
        Row::emphasized("Total Amount:", format_price(order.final_total)),
    ];

    let customer_info = vec![
        Row::emphasized("Name:", customer.name.clone()),
        Row::new("Phone:", customer.phone.clone()),
        Row::new("Email:", customer.email.clone()),
        Row::new("Address:", customer.address.clone()),
        Row::new("City:", customer.city.clone()),
        Row::new("Postal Code:", customer.postal_code.clone()),
    ];

    let mut delivery_info = vec![
        Row::emphasized("Payment Method:", order.payment_method.clone()),
        Row::new("Nearby Place:", customer.nearby_place.clone()),
        Row::emphasized("Total Items:", order.total_items.to_string()),
    ];
    if let Some(notes) = customer.notes() {
        delivery_info.push(Row::new("Special Instructions:", format!("\"{notes}\"")));
    }

    let lines = order
        .items
        .iter()
        .map(|item| ItemLine {
            name: item.name.clone(),
            quantity: format!("Qty: {}", item.quantity),
            unit_price: format_price(item.price),
            subtotal: format_price(item.line_total()),
        })
        .collect();

    let mut summary = vec![Row::new("Subtotal:", format_price(order.total_amount))];
    if order.shipping_cost > Decimal::ZERO {
        summary.push(Row::new("Shipping:", format_price(order.shipping_cost)));
    }
    if order.tax > Decimal::ZERO {
        summary.push(Row::new("Tax:", format_price(order.tax)));
    }

    ReceiptDocument {
        blocks: vec![
            Block::Header {
                title: STORE_NAME.to_string(),
                tagline: STORE_TAGLINE.to_string(),
                subtitle: "Order Receipt".to_string(),
            },
            Block::Section {
                title: "Order Information".to_string(),
                style: RowStyle::Inline,
                rows: order_info,
            },
            Block::Section {
                title: "Customer Information".to_string(),
                style: RowStyle::Stacked,
                rows: customer_info,
            },
            Block::Section {
                title: "Delivery Information".to_string(),
                style: RowStyle::Stacked,
                rows: delivery_info,
            },
            Block::Items {
                title: "Order Items".to_string(),
                lines,
            },
            Block::Summary {
                title: "Order Summary".to_string(),
                rows: summary,
                total: Row::emphasized("Total:", format_price(order.final_total)),
            },
            Block::Footer {
                lines: vec![
                    "Thank you for shopping with us!".to_string(),
                    "We appreciate your business and hope you love your purchase!".to_string(),
                ],
                meta: vec![
                    format!("Order #{}", order.order_number),
                    format!("Generated on {}", format_timestamp(now)),
                    format!("{STORE_NAME} - {STORE_TAGLINE}"),
                ],
            },
        ],
    }
}
