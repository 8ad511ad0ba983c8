//! Order commands.
//!
//! One-shot commands print their result to stdout; status and receipt
//! commands also raise a notification on stderr. `browse` keeps a listing
//! controller alive and reads commands from stdin until `q` or EOF.

use std::path::PathBuf;
use std::str::FromStr;

use street_admin::config::ReceiptConfig;
use street_admin::orders::{LOAD_FAILED_MESSAGE, ListingController, ListingQuery, ListingState};
use street_admin::receipt::ReceiptService;
use street_admin::{AppError, AppState, api::ApiClient};
use street_admin_core::{GuestId, Order, OrderId, OrderStatus, Page};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::output;

/// Errors parsing an interactive browse command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrowseCommandError {
    #[error("Unknown command: {0}. Type `help` for commands.")]
    Unknown(String),

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),
}

/// A line typed into `browse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    /// `/term`; a bare `/` clears the search
    Search(String),
    /// `status <name|all>`
    Status(Option<OrderStatus>),
    Next,
    Prev,
    Page(u32),
    Refresh,
    Help,
    Quit,
}

impl FromStr for BrowseCommand {
    type Err = BrowseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        if let Some(term) = line.strip_prefix('/') {
            return Ok(Self::Search(term.to_string()));
        }

        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match (word.to_ascii_lowercase().as_str(), rest) {
            ("n" | "next", "") => Ok(Self::Next),
            ("p" | "prev", "") => Ok(Self::Prev),
            ("r" | "refresh", "") => Ok(Self::Refresh),
            ("q" | "quit", "") => Ok(Self::Quit),
            ("h" | "help" | "?", "") => Ok(Self::Help),
            ("page", n) => n
                .parse()
                .map(Self::Page)
                .map_err(|_| BrowseCommandError::InvalidPage(n.to_string())),
            ("status", "all") => Ok(Self::Status(None)),
            ("status", name) => name
                .parse()
                .map(|status| Self::Status(Some(status)))
                .map_err(|_| BrowseCommandError::InvalidStatus(name.to_string())),
            _ => Err(BrowseCommandError::Unknown(line.to_string())),
        }
    }
}

const BROWSE_HELP: &str = "\
Commands:
  /TERM            search by order number or customer (/ alone clears)
  status NAME|all  filter by status
  n, next          next page
  p, prev          previous page
  page N           jump to page N
  r, refresh       reload from the server
  q, quit          exit";

/// Title line plus help, shown when browsing starts.
fn browse_banner(app_name: &str) -> String {
    format!("{app_name} - orders\n\n{BROWSE_HELP}")
}

/// List one page of orders.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for page 0, otherwise fetch errors.
pub async fn list(
    state: &AppState,
    page: u32,
    status: Option<OrderStatus>,
    search: Option<&str>,
) -> Result<(), AppError> {
    let query = ListingQuery::new(state.config().page_size)
        .with_status(status)
        .with_search(search.unwrap_or_default())
        .with_page(page);

    let result = match query {
        Ok(query) => state.store().list(&query).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(page) => {
            output::print(&output::render_page(&page));
            Ok(())
        }
        Err(e) => {
            e.report();
            let message = match &e {
                AppError::BadRequest(message) => message.clone(),
                _ => LOAD_FAILED_MESSAGE.to_string(),
            };
            state.notifier().error(&message);
            Err(e)
        }
    }
}

/// Show one order by ID.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the order does not exist.
pub async fn show(state: &AppState, id: &str) -> Result<(), AppError> {
    let order = notify_err(state, state.store().get(&OrderId::new(id)).await)?;
    output::print(&output::render_order(&order));
    Ok(())
}

/// Show one order by order number.
///
/// # Errors
///
/// Returns `AppError::NotFound` if no order has that number.
pub async fn show_by_number(state: &AppState, order_number: &str) -> Result<(), AppError> {
    let order = notify_err(state, state.client().get_order_by_number(order_number).await)?;
    output::print(&output::render_order(&order));
    Ok(())
}

/// List the orders of one guest.
///
/// # Errors
///
/// Propagates fetch errors.
pub async fn guest(
    state: &AppState,
    guest_id: &str,
    page: u32,
    limit: Option<u32>,
) -> Result<(), AppError> {
    let limit = limit.unwrap_or(state.config().page_size);
    let orders: Page<Order> = notify_err(
        state,
        state
            .client()
            .list_guest_orders(&GuestId::new(guest_id), page, limit)
            .await,
    )?;
    output::print(&output::render_page(&orders));
    Ok(())
}

/// Move an order to `status`.
///
/// # Errors
///
/// Returns `AppError::IllegalTransition` if the move is not allowed.
pub async fn set_status(state: &AppState, id: &str, status: OrderStatus) -> Result<(), AppError> {
    let order = state
        .status_controller()
        .update_status(&OrderId::new(id), status)
        .await?;
    output::print(&output::render_order(&order));
    Ok(())
}

/// Move an order one step along the happy path.
///
/// # Errors
///
/// Returns `AppError::IllegalTransition` for terminal orders.
pub async fn advance(state: &AppState, id: &str) -> Result<(), AppError> {
    let order = state.status_controller().advance(&OrderId::new(id)).await?;
    output::print(&output::render_order(&order));
    Ok(())
}

/// Cancel an order.
///
/// # Errors
///
/// Returns `AppError::IllegalTransition` for terminal orders.
pub async fn cancel(state: &AppState, id: &str) -> Result<(), AppError> {
    let order = state.status_controller().cancel(&OrderId::new(id)).await?;
    output::print(&output::render_order(&order));
    Ok(())
}

/// Save a PNG receipt for an order.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown orders and `AppError::Receipt`
/// if the image cannot be produced or written.
pub async fn receipt(state: &AppState, id: &str, out: Option<PathBuf>) -> Result<(), AppError> {
    let order = notify_err(state, state.store().get(&OrderId::new(id)).await)?;

    let service = match out {
        Some(output_dir) => ReceiptService::from_config(
            &ReceiptConfig {
                output_dir,
                ..state.config().receipt.clone()
            },
            state.notifier(),
        ),
        None => state.receipts(),
    };

    let saved = service.download(&order).await?;
    output::print(&format!(
        "{} ({}x{})",
        saved.path.display(),
        saved.width,
        saved.height
    ));
    Ok(())
}

/// Interactive listing.
///
/// # Errors
///
/// Returns `AppError::Io` if stdin cannot be read.
pub async fn browse(state: &AppState) -> Result<(), AppError> {
    let listing = state.listing_controller();
    let printer = tokio::spawn(print_listing(listing.subscribe()));

    output::print(&browse_banner(&state.config().app_name));
    // Failures are published to the listing state and notified.
    let _ = listing.load().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<BrowseCommand>() {
            Ok(BrowseCommand::Quit) => break,
            Ok(command) => apply(state, &listing, command).await,
            Err(e) => state.notifier().error(&e.to_string()),
        }
    }

    drop(listing);
    printer.abort();
    Ok(())
}

async fn apply(state: &AppState, listing: &ListingController<ApiClient>, command: BrowseCommand) {
    let result = match command {
        BrowseCommand::Search(term) => {
            listing.set_search(&term);
            return;
        }
        BrowseCommand::Help => {
            output::print(BROWSE_HELP);
            return;
        }
        BrowseCommand::Quit => return,
        BrowseCommand::Status(status) => listing.set_status_filter(status).await,
        BrowseCommand::Next => listing.next_page().await,
        BrowseCommand::Prev => listing.prev_page().await,
        BrowseCommand::Page(page) => listing.set_page(page).await,
        BrowseCommand::Refresh => listing.refresh().await,
    };

    // Fetch failures were already notified by the controller.
    if let Err(AppError::BadRequest(message)) = result {
        state.notifier().error(&message);
    }
}

async fn print_listing(mut rx: tokio::sync::watch::Receiver<ListingState>) {
    while rx.changed().await.is_ok() {
        let text = {
            let state = rx.borrow_and_update();
            if matches!(*state, ListingState::Loading { .. }) {
                continue;
            }
            output::render_listing(&state)
        };
        output::print(&text);
    }
}

fn notify_err<T>(state: &AppState, result: Result<T, AppError>) -> Result<T, AppError> {
    result.inspect_err(|e| {
        e.report();
        state.notifier().error(&e.user_message());
    })
}
