//! Application state shared by every front end.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::AdminConfig;
use crate::error::AppError;
use crate::notify::Notifier;
use crate::orders::{ListingController, StatusController};
use crate::receipt::ReceiptService;
use crate::session::Session;
use crate::store::OrderStore;

/// Wires configuration, session, API client and order store together.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    session: Session,
    client: ApiClient,
    store: OrderStore<ApiClient>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("client", &self.inner.client)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Load the persisted session and build the state.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the token file cannot be read, or
    /// `AppError::Http` if the HTTP client cannot be built.
    pub async fn load(config: AdminConfig, notifier: Arc<dyn Notifier>) -> Result<Self, AppError> {
        let session = Session::load(&config.token_file).await?;
        Self::new(config, session, notifier)
    }

    /// Build the state around an existing session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Http` if the HTTP client cannot be built.
    pub fn new(
        config: AdminConfig,
        session: Session,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AppError> {
        let client = ApiClient::new(&config.api, session.clone())?;
        let store = OrderStore::new(client.clone(), config.cache_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                client,
                store,
                notifier,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    #[must_use]
    pub fn store(&self) -> &OrderStore<ApiClient> {
        &self.inner.store
    }

    #[must_use]
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.inner.notifier)
    }

    /// Status controller over the shared store.
    #[must_use]
    pub fn status_controller(&self) -> StatusController<ApiClient> {
        StatusController::new(self.inner.store.clone(), self.notifier())
    }

    /// Fresh listing controller over the shared store.
    #[must_use]
    pub fn listing_controller(&self) -> ListingController<ApiClient> {
        ListingController::new(
            self.inner.store.clone(),
            self.notifier(),
            self.inner.config.page_size,
            self.inner.config.search_debounce,
        )
    }

    /// Receipt service writing into the configured directory.
    #[must_use]
    pub fn receipts(&self) -> ReceiptService {
        ReceiptService::from_config(&self.inner.config.receipt, self.notifier())
    }
}
