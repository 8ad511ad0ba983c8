//! Unified error handling for the admin library.

use street_admin_core::OrderStatus;
use thiserror::Error;

use crate::config::ConfigError;
use crate::receipt::ReceiptError;

/// Application-level error type for the admin tooling.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport failure or request timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The order service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the response body, if any.
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested status change is not in the transition table.
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition {
        /// Status the order currently has.
        from: OrderStatus,
        /// Status that was requested.
        to: OrderStatus,
    },

    /// Receipt could not be produced.
    #[error("Receipt error: {0}")]
    Receipt(#[from] ReceiptError),

    /// Local I/O failed (token file, output directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session state is unusable.
    #[error("Session error: {0}")]
    Session(String),

    /// Bad request from the caller.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error comes from our side or the order service rather than the caller.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Http(_)
            | Self::Decode(_)
            | Self::Receipt(_)
            | Self::Io(_)
            | Self::Internal(_)
            | Self::Config(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::NotFound(_)
            | Self::IllegalTransition { .. }
            | Self::Session(_)
            | Self::BadRequest(_) => false,
        }
    }

    /// Message safe to show to an operator.
    ///
    /// Internal details are never included.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => "Order not found.".to_string(),
            Self::IllegalTransition { from, to } => format!(
                "Cannot change order status from {} to {}.",
                from.label(),
                to.label()
            ),
            Self::Api { status: 401 | 403, .. } | Self::Session(_) => {
                "Your session is not authorized. Set a valid token and try again.".to_string()
            }
            Self::BadRequest(message) => message.clone(),
            Self::Receipt(_) => "Failed to generate receipt. Please try again.".to_string(),
            Self::Config(_) => "Configuration error. Check the admin settings.".to_string(),
            Self::Http(_) | Self::Api { .. } | Self::Decode(_) => {
                "Could not reach the order service. Please try again.".to_string()
            }
            Self::Io(_) | Self::Internal(_) => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// Log the error and, for server-side failures, capture it in Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin operation error"
            );
        } else {
            tracing::warn!(error = %self, "Admin operation rejected");
        }
    }
}
