//! Read-through order cache.
//!
//! Mirrors the remote order list using `moka` (5-minute TTL by default).
//! Listing pages are keyed by their [`ListingQuery`]; single records by
//! [`OrderId`]. Every listing belongs to the one `Order` tag, so a mutation
//! drops them all with [`OrderStore::invalidate_listings`].
//!
//! Every mutation bumps an epoch. A fetch that straddles a bump answers its
//! caller but does not write what it fetched back into the cache, and a
//! fetched record never replaces a cached one with a later `updated_at`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use street_admin_core::{Order, OrderId, Page};
use tracing::{debug, instrument};

use crate::api::OrderBackend;
use crate::error::AppError;
use crate::orders::ListingQuery;

const MAX_LISTINGS: u64 = 200;
const MAX_RECORDS: u64 = 5_000;

/// Shared order cache in front of an [`OrderBackend`].
pub struct OrderStore<B> {
    inner: Arc<OrderStoreInner<B>>,
}

struct OrderStoreInner<B> {
    backend: B,
    listings: Cache<ListingQuery, Page<Order>>,
    records: Cache<OrderId, Order>,
    epoch: AtomicU64,
}

impl<B> OrderStoreInner<B> {
    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }
}

impl<B> Clone for OrderStore<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B> std::fmt::Debug for OrderStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore")
            .field("listings", &self.inner.listings.entry_count())
            .field("records", &self.inner.records.entry_count())
            .finish_non_exhaustive()
    }
}

impl<B: OrderBackend> OrderStore<B> {
    /// Create a store whose entries live for `ttl`.
    #[must_use]
    pub fn new(backend: B, ttl: Duration) -> Self {
        let listings = Cache::builder()
            .max_capacity(MAX_LISTINGS)
            .time_to_live(ttl)
            .build();
        let records = Cache::builder()
            .max_capacity(MAX_RECORDS)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(OrderStoreInner {
                backend,
                listings,
                records,
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// The backend behind the cache.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// One listing page, from cache when present.
    ///
    /// Records on a fetched page also populate the record cache.
    ///
    /// # Errors
    ///
    /// Propagates backend errors; nothing is cached on failure.
    #[instrument(skip(self), fields(page = query.page()))]
    pub async fn list(&self, query: &ListingQuery) -> Result<Page<Order>, AppError> {
        if let Some(page) = self.inner.listings.get(query).await {
            debug!("Cache hit for listing");
            return Ok(page);
        }
        self.refresh_list(query).await
    }

    /// One listing page, always from the backend.
    ///
    /// Cached records newer than their fetched copy win over the response.
    /// If the store was mutated while the request was in flight, the page is
    /// returned but nothing from it is cached.
    ///
    /// # Errors
    ///
    /// Propagates backend errors; nothing is cached on failure.
    #[instrument(skip(self), fields(page = query.page()))]
    pub async fn refresh_list(&self, query: &ListingQuery) -> Result<Page<Order>, AppError> {
        let epoch = self.inner.epoch();
        let mut page = self.inner.backend.list_orders(query).await?;
        let stale = self.inner.epoch() != epoch;

        for order in &mut page.records {
            match self.inner.records.get(&order.id).await {
                Some(cached) if cached.updated_at > order.updated_at => *order = cached,
                _ if stale => {}
                _ => {
                    self.inner
                        .records
                        .insert(order.id.clone(), order.clone())
                        .await;
                }
            }
        }

        if stale {
            debug!("Orders changed during fetch, listing not cached");
        } else {
            self.inner.listings.insert(query.clone(), page.clone()).await;
        }

        Ok(page)
    }

    /// One order, from cache when present.
    ///
    /// # Errors
    ///
    /// Propagates backend errors, including `AppError::NotFound`.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: &OrderId) -> Result<Order, AppError> {
        if let Some(order) = self.inner.records.get(id).await {
            debug!("Cache hit for order");
            return Ok(order);
        }

        let epoch = self.inner.epoch();
        let order = self.inner.backend.get_order(id).await?;
        if self.inner.epoch() == epoch {
            self.inner.records.insert(id.clone(), order.clone()).await;
        } else if let Some(cached) = self.inner.records.get(id).await {
            return Ok(cached);
        }
        Ok(order)
    }

    /// Cached copy of an order without touching the backend.
    pub async fn cached(&self, id: &OrderId) -> Option<Order> {
        self.inner.records.get(id).await
    }

    /// Replace the cached record wholesale.
    pub async fn replace(&self, order: Order) {
        self.inner.bump_epoch();
        self.inner.records.insert(order.id.clone(), order).await;
    }

    /// Drop every cached listing page.
    pub async fn invalidate_listings(&self) {
        self.inner.bump_epoch();
        self.inner.listings.invalidate_all();
        self.inner.listings.run_pending_tasks().await;
    }

    /// Drop everything.
    pub async fn invalidate_all(&self) {
        self.inner.bump_epoch();
        self.inner.listings.invalidate_all();
        self.inner.records.invalidate_all();
        self.inner.listings.run_pending_tasks().await;
        self.inner.records.run_pending_tasks().await;
    }
}
