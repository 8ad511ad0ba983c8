//! Terminal rendering.
//!
//! Rendering builds strings so it can be tested; only the `print_*`
//! wrappers touch stdout.

use std::fmt::Write as _;

use street_admin::format::{format_date, format_datetime, format_price};
use street_admin::notify::Notifier;
use street_admin::orders::ListingState;
use street_admin_core::{Order, Page};

/// Notifier that writes toasts to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    #[allow(clippy::print_stderr)]
    fn success(&self, message: &str) {
        eprintln!("✓ {message}");
    }

    #[allow(clippy::print_stderr)]
    fn error(&self, message: &str) {
        eprintln!("✗ {message}");
    }
}

/// Report an error that happens before logging is set up.
#[allow(clippy::print_stderr)]
pub fn fatal(message: &str) {
    eprintln!("error: {message}");
}

#[allow(clippy::print_stdout)]
pub fn print(text: &str) {
    println!("{text}");
}

/// One row per order plus a pagination footer.
pub fn render_page(page: &Page<Order>) -> String {
    if page.records.is_empty() {
        return "No orders found.".to_string();
    }

    let mut out = format!(
        "{:<26} {:<12} {:<20} {:>5} {:>14} {:<12} {:<10}\n",
        "ID", "ORDER", "CUSTOMER", "ITEMS", "TOTAL", "STATUS", "DATE"
    );
    for order in &page.records {
        let _ = writeln!(
            out,
            "{:<26} {:<12} {:<20} {:>5} {:>14} {:<12} {:<10}",
            order.id.as_str(),
            truncate(&order.order_number, 12),
            truncate(&order.customer_details.name, 20),
            order.item_count(),
            format_price(order.final_total),
            order.status.label(),
            format_date(order.created_at),
        );
    }
    let _ = write!(
        out,
        "Page {} of {} ({} orders)",
        page.pagination.page,
        page.total_pages(),
        page.pagination.total
    );
    out
}

/// Full details of one order.
pub fn render_order(order: &Order) -> String {
    let customer = &order.customer_details;
    let mut out = String::new();

    let _ = writeln!(out, "Order {} ({})", order.order_number, order.id.as_str());
    let _ = writeln!(out, "Status:   {}", order.status.label());
    let _ = writeln!(out, "Placed:   {}", format_datetime(order.created_at));
    let _ = writeln!(out, "Updated:  {}", format_datetime(order.updated_at));
    let _ = writeln!(out, "Payment:  {}", order.payment_method);

    out.push_str("\nCustomer\n");
    let _ = writeln!(out, "  {}", customer.name);
    let _ = writeln!(out, "  {} / {}", customer.email, customer.phone);
    let _ = writeln!(out, "  {}", customer.address);
    if !customer.nearby_place.is_empty() {
        let _ = writeln!(out, "  Near {}", customer.nearby_place);
    }
    let _ = writeln!(out, "  {} {}", customer.city, customer.postal_code);
    if let Some(notes) = customer.notes() {
        let _ = writeln!(out, "  Notes: {notes}");
    }

    out.push_str("\nItems\n");
    for item in &order.items {
        let _ = writeln!(
            out,
            "  {} x{} @ {} = {}",
            item.name,
            item.quantity,
            format_price(item.price),
            format_price(item.line_total())
        );
    }

    out.push('\n');
    let _ = writeln!(out, "Subtotal: {}", format_price(order.total_amount));
    let _ = writeln!(out, "Shipping: {}", format_price(order.shipping_cost));
    let _ = writeln!(out, "Tax:      {}", format_price(order.tax));
    let _ = write!(out, "Total:    {}", format_price(order.final_total));

    if order.status.is_terminal() {
        return out;
    }
    let next: Vec<&str> = order
        .status
        .allowed_transitions()
        .into_iter()
        .map(|status| status.as_str())
        .collect();
    let _ = write!(out, "\nNext:     {}", next.join(", "));
    out
}

/// Status line plus the page when loaded.
pub fn render_listing(state: &ListingState) -> String {
    let header = state.query().map(|query| {
        let status = query.status().map_or("all", |status| status.as_str());
        query.search().map_or_else(
            || format!("[status: {status}]"),
            |term| format!("[status: {status}, search: \"{term}\"]"),
        )
    });

    match state {
        ListingState::Idle => "Nothing loaded yet.".to_string(),
        ListingState::Loading { query } => format!("Loading page {}...", query.page()),
        ListingState::Loaded { page, .. } => {
            format!("{}\n{}", header.unwrap_or_default(), render_page(page))
        }
        ListingState::Failed { message, .. } => {
            format!("{}\n{message}", header.unwrap_or_default())
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}
