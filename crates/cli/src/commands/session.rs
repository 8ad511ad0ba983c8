//! Session token commands.
//!
//! # Usage
//!
//! ```bash
//! # Pass the token directly
//! street-cli session set-token eyJhbGciOi...
//!
//! # Or pipe it in so it stays out of shell history
//! pbpaste | street-cli session set-token
//! ```

use secrecy::SecretString;
use street_admin::AppError;
use street_admin::session::Session;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::output;

/// Store a bearer token, reading it from stdin when not given.
///
/// # Errors
///
/// Returns `AppError::Session` for a blank token and `AppError::Io` if the
/// token cannot be read or persisted.
pub async fn set_token(session: &Session, token: Option<String>) -> Result<(), AppError> {
    let token = match token {
        Some(token) => token,
        None => BufReader::new(tokio::io::stdin())
            .lines()
            .next_line()
            .await?
            .unwrap_or_default(),
    };

    if let Err(e) = session.set_token(SecretString::from(token)).await {
        output::fatal(&e.to_string());
        return Err(e);
    }

    match session.path() {
        Some(path) => output::print(&format!("Token saved to {}", path.display())),
        None => output::print("Token set for this run"),
    }
    Ok(())
}

/// Forget the stored token.
///
/// # Errors
///
/// Returns `AppError::Io` if the token file cannot be removed.
pub async fn logout(session: &Session) -> Result<(), AppError> {
    session.clear().await?;
    output::print("Logged out");
    Ok(())
}

/// Report whether a token is stored.
#[allow(clippy::unnecessary_wraps)]
pub async fn status(session: &Session) -> Result<(), AppError> {
    let location = session
        .path()
        .map_or_else(String::new, |path| format!(" ({})", path.display()));
    if session.is_authenticated().await {
        output::print(&format!("Authenticated{location}"));
    } else {
        output::print(&format!("Not authenticated{location}"));
    }
    Ok(())
}
