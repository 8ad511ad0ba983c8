//! Bearer-token session.
//!
//! A single `Session` owns the persisted credential for the process: it is
//! loaded once at startup, handed explicitly to the API client, and cleared
//! on logout. Nothing else reads the token file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::AppError;

/// Shared handle to the current credential.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    /// Backing file; `None` keeps the token in memory only.
    path: Option<PathBuf>,
    token: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.inner.path)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Session {
    fn build(path: Option<PathBuf>, token: Option<SecretString>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                path,
                token: RwLock::new(token),
            }),
        }
    }

    /// In-memory session without a token.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::build(None, None)
    }

    /// In-memory session holding `token`.
    #[must_use]
    pub fn with_token(token: SecretString) -> Self {
        Self::build(None, Some(token))
    }

    /// Load the session persisted at `path`.
    ///
    /// A missing or blank file yields an unauthenticated session that will
    /// persist to `path` once a token is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file exists but cannot be read.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();
        let token = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let trimmed = contents.trim();
                (!trimmed.is_empty()).then(|| SecretString::from(trimmed.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(authenticated = token.is_some(), "Session loaded");
        Ok(Self::build(Some(path), token))
    }

    /// Where the token is persisted, if anywhere.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Current token, if any.
    pub async fn token(&self) -> Option<SecretString> {
        self.inner.token.read().await.clone()
    }

    /// Whether a token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// `Authorization` header value for outgoing requests.
    pub(crate) async fn authorization(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .await
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }

    /// Replace the token and persist it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` for a blank token and `AppError::Io` if
    /// the token file cannot be written.
    #[instrument(skip_all)]
    pub async fn set_token(&self, token: SecretString) -> Result<(), AppError> {
        let value = token.expose_secret().trim().to_string();
        if value.is_empty() {
            return Err(AppError::Session("token cannot be empty".to_string()));
        }

        if let Some(path) = &self.inner.path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            write_private(path, &value).await?;
        }

        *self.inner.token.write().await = Some(SecretString::from(value));
        tracing::info!("Session token updated");
        Ok(())
    }

    /// Forget the token and delete the persisted copy (logout).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the token file exists but cannot be removed.
    #[instrument(skip_all)]
    pub async fn clear(&self) -> Result<(), AppError> {
        *self.inner.token.write().await = None;

        if let Some(path) = &self.inner.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!("Session cleared");
        Ok(())
    }
}

/// Write the token file readable by the owner only, from creation on.
async fn write_private(path: &Path, token: &str) -> Result<(), AppError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    // An existing file keeps its old mode
    restrict_permissions(&file).await?;
    file.write_all(format!("{token}\n").as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(unix)]
async fn restrict_permissions(file: &tokio::fs::File) -> Result<(), AppError> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_file: &tokio::fs::File) -> Result<(), AppError> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_file_is_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::load(dir.path().join("token")).await.unwrap();
        assert!(!session.is_authenticated().await);
        assert!(session.authorization().await.is_none());
    }

    #[tokio::test]
    async fn test_set_token_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token");

        let session = Session::load(&path).await.unwrap();
        session
            .set_token(SecretString::from("  eyJhbGciOi.test  "))
            .await
            .unwrap();

        let reloaded = Session::load(&path).await.unwrap();
        assert_eq!(
            reloaded.authorization().await.as_deref(),
            Some("Bearer eyJhbGciOi.test")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        // A previously world-readable file is tightened too
        tokio::fs::write(&path, "old\n").await.unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let session = Session::load(&path).await.unwrap();
        session.set_token(SecretString::from("fresh")).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");

        let new_path = dir.path().join("new-token");
        Session::load(&new_path)
            .await
            .unwrap()
            .set_token(SecretString::from("other"))
            .await
            .unwrap();
        let mode = std::fs::metadata(&new_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        tokio::fs::write(&path, "abc123\n").await.unwrap();

        let session = Session::load(&path).await.unwrap();
        assert!(session.is_authenticated().await);

        session.clear().await.unwrap();
        assert!(!session.is_authenticated().await);
        assert!(!path.exists());

        // Clearing twice is fine.
        session.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_blank_token_rejected() {
        let session = Session::anonymous();
        let err = session.set_token(SecretString::from("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Session(_)));
    }

    #[tokio::test]
    async fn test_debug_redacts_token() {
        let session = Session::with_token(SecretString::from("super-secret-token"));
        let debug_output = format!("{session:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-token"));
    }
}
