//! Status transition controller.
//!
//! Every change goes through the legal-transition table before the order
//! service is contacted. The store is only touched after the service has
//! accepted the change.

use std::sync::Arc;

use chrono::Utc;
use street_admin_core::{Order, OrderId, OrderStatus};
use tracing::instrument;

use crate::api::OrderBackend;
use crate::error::AppError;
use crate::notify::Notifier;
use crate::store::OrderStore;

/// Shown when the order service rejects or fails a status change.
pub const UPDATE_FAILED_MESSAGE: &str = "Failed to update order status. Please try again.";

/// Issues status changes and reconciles the order store.
///
/// Overlapping updates for the same order are not serialized; the last
/// response to arrive wins in the cache.
pub struct StatusController<B> {
    store: OrderStore<B>,
    notifier: Arc<dyn Notifier>,
}

impl<B> Clone for StatusController<B> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<B: OrderBackend> StatusController<B> {
    #[must_use]
    pub fn new(store: OrderStore<B>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Move an order to `target`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::IllegalTransition` without contacting the service
    /// when the table forbids the change (including `target` equal to the
    /// current status), otherwise any lookup or update error.
    #[instrument(skip(self), fields(order_id = %id, target = %target))]
    pub async fn update_status(&self, id: &OrderId, target: OrderStatus) -> Result<Order, AppError> {
        self.run(id, |_| Some(target)).await
    }

    /// Move an order one step along the happy path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::IllegalTransition` for terminal orders.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn advance(&self, id: &OrderId) -> Result<Order, AppError> {
        self.run(id, OrderStatus::next).await
    }

    /// Cancel an order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::IllegalTransition` for terminal orders.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel(&self, id: &OrderId) -> Result<Order, AppError> {
        self.run(id, |_| Some(OrderStatus::Cancelled)).await
    }

    async fn run<F>(&self, id: &OrderId, pick: F) -> Result<Order, AppError>
    where
        F: FnOnce(OrderStatus) -> Option<OrderStatus> + Send,
    {
        match self.transition(id, pick).await {
            Ok(order) => {
                self.notifier.success(&format!(
                    "Order status updated to {}",
                    order.status.label()
                ));
                Ok(order)
            }
            Err(e) => {
                e.report();
                match &e {
                    AppError::IllegalTransition { .. } => self.notifier.error(&e.user_message()),
                    _ => self.notifier.error(UPDATE_FAILED_MESSAGE),
                }
                Err(e)
            }
        }
    }

    async fn transition<F>(&self, id: &OrderId, pick: F) -> Result<Order, AppError>
    where
        F: FnOnce(OrderStatus) -> Option<OrderStatus> + Send,
    {
        let current = self.store.get(id).await?;
        let from = current.status;
        let to = pick(from).unwrap_or(from);

        if !from.can_transition_to(to) {
            return Err(AppError::IllegalTransition { from, to });
        }

        let mut updated = self.store.backend().update_status(id, to).await?;
        if updated.updated_at <= current.updated_at {
            updated.apply_status(updated.status, Utc::now());
        }

        self.store.replace(updated.clone()).await;
        self.store.invalidate_listings().await;

        tracing::info!(
            order_number = %updated.order_number,
            from = %from,
            to = %updated.status,
            "Order status changed"
        );
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::notify::{MemoryNotifier, Notification};
    use crate::orders::ListingQuery;
    use crate::testing::{FakeBackend, order};

    fn controller(
        orders: Vec<Order>,
    ) -> (StatusController<FakeBackend>, OrderStore<FakeBackend>, Arc<MemoryNotifier>) {
        let store = OrderStore::new(FakeBackend::with_orders(orders), Duration::from_secs(300));
        let notifier = Arc::new(MemoryNotifier::new());
        let controller = StatusController::new(store.clone(), notifier.clone());
        (controller, store, notifier)
    }

    #[tokio::test]
    async fn test_update_status_replaces_cached_record() {
        let (controller, store, notifier) =
            controller(vec![order("o1", "ORD-1", OrderStatus::Pending)]);
        let id = OrderId::new("o1");

        let updated = controller
            .update_status(&id, OrderStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Confirmed);
        assert_eq!(
            store.cached(&id).await.unwrap().status,
            OrderStatus::Confirmed
        );
        assert_eq!(
            notifier.last(),
            Some(Notification::Success(
                "Order status updated to Confirmed".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_illegal_transition_skips_network() {
        let (controller, store, notifier) =
            controller(vec![order("o1", "ORD-1", OrderStatus::Delivered)]);
        let id = OrderId::new("o1");

        let err = controller
            .update_status(&id, OrderStatus::Pending)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::IllegalTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending
            }
        ));
        assert_eq!(store.backend().update_calls(), 0);
        assert!(matches!(notifier.last(), Some(Notification::Error(_))));
    }

    #[tokio::test]
    async fn test_same_status_is_illegal() {
        let (controller, store, _) = controller(vec![order("o1", "ORD-1", OrderStatus::Shipped)]);

        let err = controller
            .update_status(&OrderId::new("o1"), OrderStatus::Shipped)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::IllegalTransition { .. }));
        assert_eq!(store.backend().update_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_cache_untouched() {
        let (controller, store, notifier) =
            controller(vec![order("o1", "ORD-1", OrderStatus::Processing)]);
        let id = OrderId::new("o1");
        store.backend().fail_updates(true);

        let err = controller
            .update_status(&id, OrderStatus::Shipped)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Api { status: 500, .. }));
        assert_eq!(
            store.cached(&id).await.unwrap().status,
            OrderStatus::Processing
        );
        assert_eq!(
            notifier.last(),
            Some(Notification::Error(UPDATE_FAILED_MESSAGE.to_string()))
        );
    }

    #[tokio::test]
    async fn test_success_invalidates_listings() {
        let (controller, store, _) = controller(vec![order("o1", "ORD-1", OrderStatus::Pending)]);
        let query = ListingQuery::default();
        store.list(&query).await.unwrap();

        controller.cancel(&OrderId::new("o1")).await.unwrap();
        let page = store.list(&query).await.unwrap();

        assert_eq!(store.backend().list_calls(), 2);
        assert_eq!(page.records[0].status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_advance_follows_happy_path() {
        let (controller, _, _) = controller(vec![order("o1", "ORD-1", OrderStatus::Confirmed)]);
        let id = OrderId::new("o1");

        assert_eq!(
            controller.advance(&id).await.unwrap().status,
            OrderStatus::Processing
        );
        assert_eq!(
            controller.advance(&id).await.unwrap().status,
            OrderStatus::Shipped
        );
        assert_eq!(
            controller.advance(&id).await.unwrap().status,
            OrderStatus::Delivered
        );
        assert!(matches!(
            controller.advance(&id).await.unwrap_err(),
            AppError::IllegalTransition { .. }
        ));
    }

    #[tokio::test]
    async fn test_updated_at_bumped_when_server_keeps_it() {
        let (controller, store, _) = controller(vec![order("o1", "ORD-1", OrderStatus::Pending)]);
        let id = OrderId::new("o1");
        let before = store.get(&id).await.unwrap().updated_at;
        store.backend().keep_updated_at(true);

        let updated = controller
            .update_status(&id, OrderStatus::Cancelled)
            .await
            .unwrap();

        assert!(updated.updated_at > before);
        assert_eq!(updated.created_at, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_keeps_old_status_while_update_in_flight() {
        let (controller, store, _) =
            controller(vec![order("o1", "ORD-1", OrderStatus::Processing)]);
        let id = OrderId::new("o1");
        store.get(&id).await.unwrap();
        store.backend().delay_updates(Duration::from_secs(1));

        let (updated, during) = tokio::join!(
            controller.update_status(&id, OrderStatus::Shipped),
            async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                store.cached(&id).await
            }
        );

        assert_eq!(during.unwrap().status, OrderStatus::Processing);
        assert_eq!(updated.unwrap().status, OrderStatus::Shipped);
        assert_eq!(
            store.cached(&id).await.unwrap().status,
            OrderStatus::Shipped
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_fetched_before_update_does_not_restore_old_status() {
        let (controller, store, _) = controller(vec![order("o1", "ORD-1", OrderStatus::Pending)]);
        let id = OrderId::new("o1");
        let query = ListingQuery::default();
        // The listing reads the pending order, then answers after the update lands
        store.backend().delay_list_responses(Duration::from_millis(500));

        let (listed, updated) = tokio::join!(store.refresh_list(&query), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.update_status(&id, OrderStatus::Confirmed).await
        });

        assert_eq!(updated.unwrap().status, OrderStatus::Confirmed);
        assert_eq!(listed.unwrap().records[0].status, OrderStatus::Confirmed);
        assert_eq!(
            store.cached(&id).await.unwrap().status,
            OrderStatus::Confirmed
        );

        let page = store.list(&query).await.unwrap();
        assert_eq!(page.records[0].status, OrderStatus::Confirmed);
        assert_eq!(store.backend().list_calls(), 2);

        let next = controller
            .update_status(&id, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(next.status, OrderStatus::Processing);
    }
}
