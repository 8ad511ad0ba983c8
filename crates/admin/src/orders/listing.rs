//! Listing/filter controller.
//!
//! Holds the current [`ListingQuery`] and publishes fetch results on a
//! `watch` channel. Search input is debounced with a cancellable delayed
//! task; every fetch is stamped with a generation number and only the
//! latest generation may publish, so a slow response for an old query
//! never overwrites a newer one.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use street_admin_core::{Order, OrderStatus, Page};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::query::ListingQuery;
use crate::api::OrderBackend;
use crate::error::AppError;
use crate::notify::Notifier;
use crate::store::OrderStore;

/// Shown when a listing fetch fails.
pub const LOAD_FAILED_MESSAGE: &str = "Error loading orders. Please try again.";

/// What the listing view should show.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListingState {
    /// Nothing requested yet.
    #[default]
    Idle,
    Loading {
        query: ListingQuery,
    },
    Loaded {
        query: ListingQuery,
        page: Page<Order>,
    },
    Failed {
        query: ListingQuery,
        message: String,
    },
}

impl ListingState {
    /// Query the state belongs to, if any.
    #[must_use]
    pub const fn query(&self) -> Option<&ListingQuery> {
        match self {
            Self::Idle => None,
            Self::Loading { query } | Self::Loaded { query, .. } | Self::Failed { query, .. } => {
                Some(query)
            }
        }
    }
}

struct Shared<B> {
    store: OrderStore<B>,
    notifier: Arc<dyn Notifier>,
    query: Mutex<ListingQuery>,
    generation: AtomicU64,
    /// Page count from the last published result.
    pages: AtomicU32,
    state: watch::Sender<ListingState>,
}

/// Drives the order listing: pagination, status filter and debounced search.
pub struct ListingController<B: OrderBackend> {
    shared: Arc<Shared<B>>,
    debounce: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl<B: OrderBackend> ListingController<B> {
    /// Create a controller starting at page 1 with no filters.
    #[must_use]
    pub fn new(
        store: OrderStore<B>,
        notifier: Arc<dyn Notifier>,
        page_size: u32,
        debounce: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ListingState::Idle);
        Self {
            shared: Arc::new(Shared {
                store,
                notifier,
                query: Mutex::new(ListingQuery::new(page_size)),
                generation: AtomicU64::new(0),
                pages: AtomicU32::new(1),
                state,
            }),
            debounce,
            pending: Mutex::new(None),
        }
    }

    /// Current query descriptor.
    #[must_use]
    pub fn query(&self) -> ListingQuery {
        self.shared.current()
    }

    /// Watch the listing state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListingState> {
        self.shared.state.subscribe()
    }

    /// Snapshot of the listing state.
    #[must_use]
    pub fn state(&self) -> ListingState {
        self.shared.state.borrow().clone()
    }

    /// Fetch the current query, from cache when present.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors after publishing them as `Failed`.
    pub async fn load(&self) -> Result<Page<Order>, AppError> {
        let query = self.shared.current();
        self.shared.fetch(query, false).await
    }

    /// Re-issue the current query, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors after publishing them as `Failed`.
    pub async fn refresh(&self) -> Result<Page<Order>, AppError> {
        let query = self.shared.current();
        self.shared.fetch(query, true).await
    }

    /// Schedule a search for `term` once input has been quiet for the
    /// debounce delay. Any previously scheduled search is cancelled.
    #[instrument(skip(self))]
    pub fn set_search(&self, term: &str) {
        let token = CancellationToken::new();
        if let Some(previous) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone())
        {
            previous.cancel();
        }

        let shared = Arc::clone(&self.shared);
        let debounce = self.debounce;
        let term = term.to_string();

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    tracing::trace!("Search superseded");
                }
                () = tokio::time::sleep(debounce) => {
                    let query = shared.update(|query| query.with_search(&term));
                    // Failures are already published and reported.
                    let _ = shared.fetch(query, false).await;
                }
            }
        });
    }

    /// Filter by status (`None` for all) and fetch from page 1.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors after publishing them as `Failed`.
    #[instrument(skip(self))]
    pub async fn set_status_filter(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Page<Order>, AppError> {
        let query = self.shared.update(|query| query.with_status(status));
        self.shared.fetch(query, false).await
    }

    /// Jump to page `page`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for page 0, otherwise fetch errors.
    #[instrument(skip(self))]
    pub async fn set_page(&self, page: u32) -> Result<Page<Order>, AppError> {
        let query = self.shared.current().with_page(page)?;
        self.shared.update(|_| query.clone());
        self.shared.fetch(query, false).await
    }

    /// Next page, staying on the last one.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors.
    pub async fn next_page(&self) -> Result<Page<Order>, AppError> {
        let pages = self.shared.pages.load(Ordering::SeqCst).max(1);
        let page = self.shared.current().page().saturating_add(1).min(pages);
        self.set_page(page).await
    }

    /// Previous page, staying on the first one.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors.
    pub async fn prev_page(&self) -> Result<Page<Order>, AppError> {
        let page = self.shared.current().page().saturating_sub(1).max(1);
        self.set_page(page).await
    }
}

impl<B: OrderBackend> Drop for ListingController<B> {
    fn drop(&mut self) {
        if let Some(token) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
        // Anything still in flight is now stale.
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl<B: OrderBackend> Shared<B> {
    fn current(&self) -> ListingQuery {
        self.query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, change: impl FnOnce(ListingQuery) -> ListingQuery) -> ListingQuery {
        let mut query = self.query.lock().unwrap_or_else(PoisonError::into_inner);
        *query = change(query.clone());
        query.clone()
    }

    async fn fetch(&self, query: ListingQuery, fresh: bool) -> Result<Page<Order>, AppError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish(
            generation,
            ListingState::Loading {
                query: query.clone(),
            },
        );

        let result = if fresh {
            self.store.refresh_list(&query).await
        } else {
            self.store.list(&query).await
        };

        match &result {
            Ok(page) => {
                let pages = page.total_pages();
                let published = self.publish(
                    generation,
                    ListingState::Loaded {
                        query,
                        page: page.clone(),
                    },
                );
                if published {
                    self.pages.store(pages, Ordering::SeqCst);
                } else {
                    tracing::debug!(generation, "Discarded stale listing result");
                }
            }
            Err(e) => {
                e.report();
                let published = self.publish(
                    generation,
                    ListingState::Failed {
                        query,
                        message: LOAD_FAILED_MESSAGE.to_string(),
                    },
                );
                if published {
                    self.notifier.error(LOAD_FAILED_MESSAGE);
                }
            }
        }

        result
    }

    /// Publish `state` if `generation` is still the latest.
    fn publish(&self, generation: u64, state: ListingState) -> bool {
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *current = state;
            true
        })
    }
}
