//! Order service REST client.
//!
//! Provides typed access to the admin order endpoints: paginated listing,
//! single-order lookup (by id or order number), guest order history and
//! status updates.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use street_admin_core::{GuestId, Order, OrderId, OrderStatus, Page};
use tracing::instrument;
use url::Url;

use super::OrderBackend;
use super::types::{ApiErrorBody, OrdersResponse, SingleOrderResponse, UpdateOrderStatusRequest};
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::orders::ListingQuery;
use crate::session::Session;

/// Path segment all order endpoints live under.
const ORDERS_SEGMENT: &str = "order";

/// Order service API client.
///
/// Cheap to clone; clones share the connection pool and the session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `config` that authenticates with `session`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, session: Session) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("street-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                session,
            }),
        })
    }

    /// Session attached to outgoing requests.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// List orders for the admin panel.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Http` on transport failure or timeout,
    /// `AppError::Api` on a non-success response and `AppError::Decode` if
    /// the body is malformed.
    #[instrument(skip(self), fields(page = query.page(), limit = query.limit()))]
    pub async fn list_orders(&self, query: &ListingQuery) -> Result<Page<Order>, AppError> {
        let url = self.endpoint(&["admin", "all"])?;
        let request = self.inner.client.get(url).query(&query.to_params());
        let response: OrdersResponse = self.send(request, "orders").await?;
        tracing::debug!(count = response.orders.len(), "Fetched orders");
        Ok(response.into())
    }

    /// Fetch one order by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist, otherwise
    /// as [`list_orders`](Self::list_orders).
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, AppError> {
        let url = self.endpoint(&["single", id.as_str()])?;
        let response: SingleOrderResponse = self
            .send(self.inner.client.get(url), &format!("order {id}"))
            .await?;
        Ok(response.order)
    }

    /// Fetch one order by its human-readable number.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no order has that number.
    #[instrument(skip(self))]
    pub async fn get_order_by_number(&self, order_number: &str) -> Result<Order, AppError> {
        let url = self.endpoint(&["number", order_number])?;
        let response: SingleOrderResponse = self
            .send(self.inner.client.get(url), &format!("order #{order_number}"))
            .await?;
        Ok(response.order)
    }

    /// List the orders placed by one guest.
    ///
    /// # Errors
    ///
    /// As [`list_orders`](Self::list_orders).
    #[instrument(skip(self), fields(guest_id = %guest_id))]
    pub async fn list_guest_orders(
        &self,
        guest_id: &GuestId,
        page: u32,
        limit: u32,
    ) -> Result<Page<Order>, AppError> {
        let url = self.endpoint(&[guest_id.as_str(), "orders"])?;
        let request = self
            .inner
            .client
            .get(url)
            .query(&[("page", page.max(1)), ("limit", limit.max(1))]);
        let response: OrdersResponse = self.send(request, &format!("guest {guest_id}")).await?;
        Ok(response.into())
    }

    /// Set an order's status.
    ///
    /// The transition table is not checked here; callers go through
    /// [`StatusController`](crate::orders::StatusController).
    ///
    /// # Errors
    ///
    /// As [`get_order`](Self::get_order).
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        let url = self.endpoint(&["admin", id.as_str(), "status"])?;
        let request = self
            .inner
            .client
            .put(url)
            .json(&UpdateOrderStatusRequest { status });
        let response: SingleOrderResponse = self.send(request, &format!("order {id}")).await?;
        tracing::info!(order_number = %response.order.order_number, "Order status updated");
        Ok(response.order)
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// `{base}/order/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::Internal("API base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(ORDERS_SEGMENT)
            .extend(segments);
        Ok(url)
    }

    /// Attach the bearer token, send, and decode a JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<T, AppError> {
        let request = match self.inner.session.authorization().await {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(resource.to_string()));
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(ApiErrorBody::into_message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl OrderBackend for ApiClient {
    async fn list_orders(&self, query: &ListingQuery) -> Result<Page<Order>, AppError> {
        Self::list_orders(self, query).await
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, AppError> {
        Self::get_order(self, id).await
    }

    async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, AppError> {
        self.update_order_status(id, status).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::testing::order_json;

    fn test_client(base_url: &str, session: Session) -> ApiClient {
        let config = ApiConfig::new(&format!("{base_url}/api/v1")).unwrap();
        ApiClient::new(&config, session).unwrap()
    }

    #[tokio::test]
    async fn test_list_orders_sends_filters_and_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/order/admin/all"))
            .and(query_param("page", "2"))
            .and(query_param("limit", "10"))
            .and(query_param("status", "pending"))
            .and(query_param("search", "tote"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Orders fetched",
                "status": 200,
                "orders": [order_json("o1", "ORD-1", "pending")],
                "pagination": {"page": 2, "limit": 10, "total": 11, "pages": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Session::with_token(SecretString::from("t0ken")));
        let query = ListingQuery::new(10)
            .with_status(Some(OrderStatus::Pending))
            .with_search("tote")
            .with_page(2)
            .unwrap();

        let page = client.list_orders(&query).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.pagination.total, 11);
        assert_eq!(page.total_pages(), 2);
    }

    #[tokio::test]
    async fn test_get_order_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/order/single/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"message": "Order not found", "status": 404})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Session::anonymous());
        let err = client.get_order(&OrderId::new("missing")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_status_puts_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/order/admin/o1/status"))
            .and(body_json(serde_json::json!({"status": "confirmed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Order status updated",
                "status": 200,
                "order": order_json("o1", "ORD-1", "confirmed")
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Session::anonymous());
        let order = client
            .update_order_status(&OrderId::new("o1"), OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_server_error_message_is_kept() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/order/admin/o1/status"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"message": "Database unavailable"})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Session::anonymous());
        let err = client
            .update_order_status(&OrderId::new("o1"), OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Api { status: 500, ref message } if message == "Database unavailable"
        ));
    }

    #[tokio::test]
    async fn test_get_by_number_and_guest_orders() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/order/number/ORD-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "order": order_json("o7", "ORD-7", "shipped")
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/order/guest-9/orders"))
            .and(query_param("page", "1"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "orders": [order_json("o7", "ORD-7", "shipped")],
                "pagination": {"page": 1, "limit": 5, "total": 1, "pages": 1}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Session::anonymous());
        let order = client.get_order_by_number("ORD-7").await.unwrap();
        assert_eq!(order.id, OrderId::new("o7"));

        let page = client
            .list_guest_orders(&GuestId::new("guest-9"), 1, 5)
            .await
            .unwrap();
        assert_eq!(page.records.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/order/single/o1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Session::anonymous());
        let err = client.get_order(&OrderId::new("o1")).await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let config = ApiConfig::new("http://localhost:5001/api/v1/").unwrap();
        let client = ApiClient::new(&config, Session::anonymous()).unwrap();
        let url = client.endpoint(&["number", "ORD 1/2"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5001/api/v1/order/number/ORD%201%2F2"
        );
    }
}
