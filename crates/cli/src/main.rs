//! Street CLI - Order management from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Store the admin bearer token
//! street-cli session set-token eyJhbGciOi...
//!
//! # List pending orders, second page
//! street-cli orders list --status pending --page 2
//!
//! # Move an order along its lifecycle
//! street-cli orders status 66a0b1c2d3e4f5a6b7c8d9e0 confirmed
//! street-cli orders advance 66a0b1c2d3e4f5a6b7c8d9e0
//!
//! # Save a PNG receipt
//! street-cli orders receipt 66a0b1c2d3e4f5a6b7c8d9e0 --out ./receipts
//!
//! # Interactive listing with debounced search
//! street-cli orders browse
//! ```
//!
//! # Commands
//!
//! - `orders` - List, search, inspect, update and print receipts for orders
//! - `session` - Manage the persisted bearer token

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use street_admin::config::AdminConfig;
use street_admin::{AppError, AppState};
use street_admin_core::OrderStatus;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use output::ConsoleNotifier;

#[derive(Parser)]
#[command(name = "street-cli")]
#[command(author, version, about = "Women's Street order management")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage the admin session token
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders
    List {
        /// Page number (starting at 1)
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Only show orders with this status
        #[arg(short, long)]
        status: Option<OrderStatus>,

        /// Search by order number or customer
        #[arg(short = 'q', long)]
        search: Option<String>,
    },
    /// Interactive listing with debounced search
    Browse,
    /// Show one order by ID
    Show {
        /// Order ID
        id: String,
    },
    /// Show one order by order number
    Number {
        /// Order number, e.g. `ORD-100`
        order_number: String,
    },
    /// List the orders placed by a guest
    Guest {
        /// Guest ID
        guest_id: String,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Change an order's status
    Status {
        /// Order ID
        id: String,

        /// New status (`pending`, `confirmed`, `processing`, `shipped`, `delivered`, `cancelled`)
        status: OrderStatus,
    },
    /// Move an order to its next status
    Advance {
        /// Order ID
        id: String,
    },
    /// Cancel an order
    Cancel {
        /// Order ID
        id: String,
    },
    /// Save a PNG receipt for an order
    Receipt {
        /// Order ID
        id: String,

        /// Output directory (defaults to `ADMIN_RECEIPT_DIR`)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Store a bearer token (read from stdin when omitted)
    SetToken {
        token: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Show whether a token is stored
    Status,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(config: &AdminConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "street_admin=info,street_cli=info".into());

    let json_layer = config.log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!config.log_json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AdminConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            output::fatal(&e.to_string());
            return ExitCode::from(2);
        }
    };

    // Sentry before the subscriber so the tracing layer has a client
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: AdminConfig) -> Result<(), AppError> {
    let state = AppState::load(config, Arc::new(ConsoleNotifier)).await?;

    match cli.command {
        Commands::Orders { action } => match action {
            OrdersAction::List {
                page,
                status,
                search,
            } => commands::orders::list(&state, page, status, search.as_deref()).await,
            OrdersAction::Browse => commands::orders::browse(&state).await,
            OrdersAction::Show { id } => commands::orders::show(&state, &id).await,
            OrdersAction::Number { order_number } => {
                commands::orders::show_by_number(&state, &order_number).await
            }
            OrdersAction::Guest {
                guest_id,
                page,
                limit,
            } => commands::orders::guest(&state, &guest_id, page, limit).await,
            OrdersAction::Status { id, status } => {
                commands::orders::set_status(&state, &id, status).await
            }
            OrdersAction::Advance { id } => commands::orders::advance(&state, &id).await,
            OrdersAction::Cancel { id } => commands::orders::cancel(&state, &id).await,
            OrdersAction::Receipt { id, out } => {
                commands::orders::receipt(&state, &id, out).await
            }
        },
        Commands::Session { action } => match action {
            SessionAction::SetToken { token } => {
                commands::session::set_token(state.session(), token).await
            }
            SessionAction::Logout => commands::session::logout(state.session()).await,
            SessionAction::Status => commands::session::status(state.session()).await,
        },
    }
}
