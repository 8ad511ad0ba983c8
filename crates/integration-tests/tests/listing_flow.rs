//! Integration tests for the listing controller against the order service.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use street_admin::notify::Notification;
use street_admin::orders::{LOAD_FAILED_MESSAGE, ListingState};
use street_admin_core::OrderStatus;
use street_admin_integration_tests::{TestContext, order_json, orders_body};
use tokio::sync::watch;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

/// Wait until the listing settles on a loaded page matching `check`.
async fn wait_for_loaded<F>(rx: &mut watch::Receiver<ListingState>, check: F) -> ListingState
where
    F: Fn(&ListingState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let state = rx.borrow_and_update();
                if matches!(*state, ListingState::Loaded { .. }) && check(&*state) {
                    return state.clone();
                }
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_pages_and_status_filter() {
    let ctx = TestContext::new().await;

    for page in 1..=3u32 {
        Mock::given(method("GET"))
            .and(path(TestContext::api_path("admin/all")))
            .and(query_param("page", page.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(orders_body(
                vec![order_json(&format!("o{page}"), &format!("ORD-{page}"), "pending")],
                page,
                3,
                25,
            )))
            .mount(&ctx.server)
            .await;
    }

    let listing = ctx.state.listing_controller();

    let first = listing.load().await.unwrap();
    assert_eq!(first.total_pages(), 3);

    listing.next_page().await.unwrap();
    listing.next_page().await.unwrap();
    let last = listing.next_page().await.unwrap();
    assert_eq!(last.pagination.page, 3);
    assert_eq!(listing.query().page(), 3);

    listing.prev_page().await.unwrap();
    assert_eq!(listing.query().page(), 2);

    Mock::given(method("GET"))
        .and(path(TestContext::api_path("admin/all")))
        .and(query_param("status", "shipped"))
        .respond_with(ResponseTemplate::new(200).set_body_json(orders_body(
            vec![order_json("o9", "ORD-9", "shipped")],
            1,
            1,
            1,
        )))
        .with_priority(1)
        .mount(&ctx.server)
        .await;

    let shipped = listing
        .set_status_filter(Some(OrderStatus::Shipped))
        .await
        .unwrap();
    assert_eq!(listing.query().page(), 1);
    assert_eq!(shipped.records[0].status, OrderStatus::Shipped);
}

#[tokio::test]
async fn test_debounced_search_sends_only_final_term() {
    let ctx = TestContext::with_vars(&[("ADMIN_SEARCH_DEBOUNCE_MS", "100")]).await;

    Mock::given(method("GET"))
        .and(path(TestContext::api_path("admin/all")))
        .respond_with(ResponseTemplate::new(200).set_body_json(orders_body(
            vec![order_json("o1", "ORD-1", "pending")],
            1,
            1,
            1,
        )))
        .mount(&ctx.server)
        .await;

    let listing = ctx.state.listing_controller();
    let mut rx = listing.subscribe();

    listing.set_search("S");
    listing.set_search("Sa");
    listing.set_search("Sana");

    let state = wait_for_loaded(&mut rx, |state| {
        state.query().and_then(|query| query.search()) == Some("Sana")
    })
    .await;
    assert_eq!(state.query().unwrap().page(), 1);

    let searches: Vec<String> = ctx
        .server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "search")
                .map(|(_, value)| value.into_owned())
        })
        .collect();
    assert_eq!(searches, vec!["Sana".to_string()]);
}

#[tokio::test]
async fn test_slow_response_does_not_overwrite_newer_page() {
    let ctx = TestContext::new().await;

    Mock::given(method("GET"))
        .and(path(TestContext::api_path("admin/all")))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(orders_body(
                    vec![order_json("o2", "ORD-2", "pending")],
                    2,
                    3,
                    25,
                ))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path(TestContext::api_path("admin/all")))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(orders_body(
            vec![order_json("o3", "ORD-3", "pending")],
            3,
            3,
            25,
        )))
        .mount(&ctx.server)
        .await;

    let listing = ctx.state.listing_controller();

    let (slow, fast) = tokio::join!(listing.set_page(2), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        listing.set_page(3).await
    });

    // Both callers get their own page back
    assert_eq!(slow.unwrap().pagination.page, 2);
    assert_eq!(fast.unwrap().pagination.page, 3);

    match listing.state() {
        ListingState::Loaded { page, .. } => {
            assert_eq!(page.records[0].order_number, "ORD-3");
        }
        other => panic!("expected Loaded, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_load_is_published_and_notified() {
    let ctx = TestContext::new().await;

    Mock::given(method("GET"))
        .and(path(TestContext::api_path("admin/all")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&ctx.server)
        .await;

    let listing = ctx.state.listing_controller();
    assert!(listing.load().await.is_err());

    match listing.state() {
        ListingState::Failed { message, .. } => assert_eq!(message, LOAD_FAILED_MESSAGE),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(
        ctx.last_notification(),
        Notification::Error(LOAD_FAILED_MESSAGE.to_string())
    );
}
