//! # Backend API
//!
//! Typed access to the REST backend, split into trait seams so each view
//! object can be driven by an in-memory fake in tests.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         HttpBackend Request                             │
//! │                                                                         │
//! │  view object ──► CatalogApi::search_products("vacuna", page)           │
//! │                        │                                                │
//! │                        ▼                                                │
//! │  SessionStore::token() ── none? ──► Unauthenticated (no request)       │
//! │                        │                                                │
//! │                        ▼                                                │
//! │  GET {base}/api/products/search?q=vacuna&limit=40&offset=0             │
//! │      Authorization: Bearer <token>                                     │
//! │                        │                                                │
//! │            ┌───────────┴────────────┐                                   │
//! │            ▼                        ▼                                   │
//! │       2xx: decode body        non-2xx: Http { status, message }        │
//! │       ([...] | {data:[...]}        (backend `message` field)           │
//! │        | null → [])                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionStore;
use vetdesk_core::forms::{CustomerInput, ProductInput, ServiceInput};
use vetdesk_core::{Alert, Customer, Money, Product, ProfitMonth, Sale, SalePayload, SalesMonth, Service};

// =============================================================================
// Request DTOs
// =============================================================================

/// `limit` / `offset` query pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        PageRequest { limit, offset: 0 }
    }

    /// Zero-based page number.
    pub fn page(page: u32, size: u32) -> Self {
        PageRequest {
            limit: size,
            offset: page.saturating_mul(size),
        }
    }
}

/// Body of `POST /api/payments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub sale_id: i64,
    pub customer_id: Option<i64>,
    pub amount: Money,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    user: &'a str,
    pass: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

// =============================================================================
// Trait Seams
// =============================================================================

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a bearer token.
    async fn login(&self, user: &str, pass: &str) -> ClientResult<String>;
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_products(&self) -> ClientResult<Vec<Product>>;

    /// `query = None` lists without a text filter.
    async fn search_products(&self, query: Option<&str>, page: PageRequest) -> ClientResult<Vec<Product>>;

    async fn top_products(&self, limit: u32) -> ClientResult<Vec<Product>>;

    /// `GET /api/services`, optionally filtered and paged.
    async fn list_services(&self, query: Option<&str>, page: Option<PageRequest>) -> ClientResult<Vec<Service>>;

    async fn create_product(&self, input: &ProductInput) -> ClientResult<()>;
    async fn update_product(&self, id: i64, input: &ProductInput) -> ClientResult<()>;
    async fn delete_product(&self, id: i64) -> ClientResult<()>;

    async fn create_service(&self, input: &ServiceInput) -> ClientResult<()>;
    async fn update_service(&self, id: i64, input: &ServiceInput) -> ClientResult<()>;
    async fn delete_service(&self, id: i64) -> ClientResult<()>;
}

#[async_trait]
pub trait CustomerApi: Send + Sync {
    async fn list_customers(&self) -> ClientResult<Vec<Customer>>;
    async fn get_customer(&self, id: i64) -> ClientResult<Customer>;
    async fn create_customer(&self, input: &CustomerInput) -> ClientResult<()>;
    async fn update_customer(&self, id: i64, input: &CustomerInput) -> ClientResult<()>;
    async fn delete_customer(&self, id: i64) -> ClientResult<()>;

    /// `DELETE /api/customers/:id/sales`: marks the whole account settled.
    async fn settle_account(&self, id: i64) -> ClientResult<()>;
}

#[async_trait]
pub trait SalesApi: Send + Sync {
    /// All sales, or one customer's when `customer_id` is given.
    async fn list_sales(&self, customer_id: Option<i64>) -> ClientResult<Vec<Sale>>;
    async fn get_sale(&self, id: i64) -> ClientResult<Sale>;
    async fn create_sale(&self, payload: &SalePayload) -> ClientResult<()>;
    async fn register_payment(&self, payment: &PaymentRequest) -> ClientResult<()>;
}

#[async_trait]
pub trait AlertsApi: Send + Sync {
    async fn list_alerts(&self) -> ClientResult<Vec<Alert>>;
    async fn resolve_alert(&self, id: i64) -> ClientResult<()>;
}

#[async_trait]
pub trait ReportsApi: Send + Sync {
    async fn sales_by_month(&self, from: NaiveDate, to: NaiveDate) -> ClientResult<Vec<SalesMonth>>;
    async fn profit_by_month(&self, from: NaiveDate, to: NaiveDate) -> ClientResult<Vec<ProfitMonth>>;
}

/// Every seam at once.
pub trait Backend: AuthApi + CatalogApi + CustomerApi + SalesApi + AlertsApi + ReportsApi {}

impl<T> Backend for T where T: AuthApi + CatalogApi + CustomerApi + SalesApi + AlertsApi + ReportsApi {}

// =============================================================================
// Body Decoding
// =============================================================================

/// Reads a list body: a bare array, `{data: [...]}`, or anything else as empty.
pub(crate) fn list_from_value<T: DeserializeOwned>(value: Value) -> ClientResult<Vec<T>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return Ok(Vec::new()),
        },
        _ => return Ok(Vec::new()),
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(ClientError::from))
        .collect()
}

/// Pulls the backend's `message` out of an error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

fn date_param(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// =============================================================================
// HTTP Backend
// =============================================================================

/// reqwest-based implementation of every API seam.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> ClientResult<Self> {
        let base = Url::parse(config.base_url())?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.api.connect_timeout_secs))
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(HttpBackend {
            client,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// Request with the session's bearer token attached.
    async fn authed(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.session.token().await?;
        Ok(self.client.request(method, self.url(path)?).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        warn!(status = status.as_u16(), ?message, "Backend request failed");
        Err(ClientError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<Vec<T>> {
        debug!(path, ?query, "GET list");
        let request = self.authed(Method::GET, path).await?.query(query);
        let value: Value = self.send(request).await?.json().await?;
        list_from_value(value)
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        debug!(path, "GET");
        let request = self.authed(Method::GET, path).await?;
        Ok(self.send(request).await?.json().await?)
    }

    async fn send_json<B: Serialize + Sync>(&self, method: Method, path: &str, body: &B) -> ClientResult<()> {
        debug!(%method, path, "Sending");
        let request = self.authed(method, path).await?.json(body);
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        debug!(path, "DELETE");
        let request = self.authed(Method::DELETE, path).await?;
        self.send(request).await?;
        Ok(())
    }
}

fn search_query(query: Option<&str>, page: Option<PageRequest>) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(q) = query {
        params.push(("q", q.to_string()));
    }
    if let Some(page) = page {
        params.push(("limit", page.limit.to_string()));
        if page.offset > 0 {
            params.push(("offset", page.offset.to_string()));
        }
    }
    params
}

#[async_trait]
impl AuthApi for HttpBackend {
    async fn login(&self, user: &str, pass: &str) -> ClientResult<String> {
        let request = self
            .client
            .post(self.url("/api/login")?)
            .json(&LoginRequest { user, pass });
        let body: LoginResponse = self.send(request).await?.json().await?;
        body.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Decode("login response has no token".into()))
    }
}

#[async_trait]
impl CatalogApi for HttpBackend {
    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        self.get_list("/api/products", &[]).await
    }

    async fn search_products(&self, query: Option<&str>, page: PageRequest) -> ClientResult<Vec<Product>> {
        self.get_list("/api/products/search", &search_query(query, Some(page)))
            .await
    }

    async fn top_products(&self, limit: u32) -> ClientResult<Vec<Product>> {
        self.get_list("/api/products/top", &[("limit", limit.to_string())])
            .await
    }

    async fn list_services(&self, query: Option<&str>, page: Option<PageRequest>) -> ClientResult<Vec<Service>> {
        self.get_list("/api/services", &search_query(query, page)).await
    }

    async fn create_product(&self, input: &ProductInput) -> ClientResult<()> {
        self.send_json(Method::POST, "/api/products", input).await
    }

    async fn update_product(&self, id: i64, input: &ProductInput) -> ClientResult<()> {
        self.send_json(Method::PUT, &format!("/api/products/{}", id), input)
            .await
    }

    async fn delete_product(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/api/products/{}", id)).await
    }

    async fn create_service(&self, input: &ServiceInput) -> ClientResult<()> {
        self.send_json(Method::POST, "/api/services", input).await
    }

    async fn update_service(&self, id: i64, input: &ServiceInput) -> ClientResult<()> {
        self.send_json(Method::PUT, &format!("/api/services/{}", id), input)
            .await
    }

    async fn delete_service(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/api/services/{}", id)).await
    }
}

#[async_trait]
impl CustomerApi for HttpBackend {
    async fn list_customers(&self) -> ClientResult<Vec<Customer>> {
        self.get_list("/api/customers", &[]).await
    }

    async fn get_customer(&self, id: i64) -> ClientResult<Customer> {
        self.get_one(&format!("/api/customers/{}", id)).await
    }

    async fn create_customer(&self, input: &CustomerInput) -> ClientResult<()> {
        self.send_json(Method::POST, "/api/customers", input).await
    }

    async fn update_customer(&self, id: i64, input: &CustomerInput) -> ClientResult<()> {
        self.send_json(Method::PUT, &format!("/api/customers/{}", id), input)
            .await
    }

    async fn delete_customer(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/api/customers/{}", id)).await
    }

    async fn settle_account(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/api/customers/{}/sales", id)).await
    }
}

#[async_trait]
impl SalesApi for HttpBackend {
    async fn list_sales(&self, customer_id: Option<i64>) -> ClientResult<Vec<Sale>> {
        let query: Vec<(&str, String)> = customer_id
            .map(|id| vec![("customerId", id.to_string())])
            .unwrap_or_default();
        self.get_list("/api/sales", &query).await
    }

    async fn get_sale(&self, id: i64) -> ClientResult<Sale> {
        self.get_one(&format!("/api/sales/{}", id)).await
    }

    async fn create_sale(&self, payload: &SalePayload) -> ClientResult<()> {
        self.send_json(Method::POST, "/api/sales", payload).await
    }

    async fn register_payment(&self, payment: &PaymentRequest) -> ClientResult<()> {
        self.send_json(Method::POST, "/api/payments", payment).await
    }
}

#[async_trait]
impl AlertsApi for HttpBackend {
    async fn list_alerts(&self) -> ClientResult<Vec<Alert>> {
        self.get_list("/api/alerts", &[]).await
    }

    async fn resolve_alert(&self, id: i64) -> ClientResult<()> {
        debug!(id, "Resolving alert");
        let request = self
            .authed(Method::PUT, &format!("/api/alerts/{}/resolve", id))
            .await?;
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl ReportsApi for HttpBackend {
    async fn sales_by_month(&self, from: NaiveDate, to: NaiveDate) -> ClientResult<Vec<SalesMonth>> {
        self.get_list(
            "/api/reports/sales-by-month",
            &[("from", date_param(from)), ("to", date_param(to))],
        )
        .await
    }

    async fn profit_by_month(&self, from: NaiveDate, to: NaiveDate) -> ClientResult<Vec<ProfitMonth>> {
        self.get_list(
            "/api/reports/profit-by-month",
            &[("from", date_param(from)), ("to", date_param(to))],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_body_shapes() {
        let bare: Vec<Customer> = list_from_value(json!([{"id": 1, "nombre": "Ana"}])).unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped: Vec<SalesMonth> = list_from_value(json!({"data": [
            {"month": "2024-01", "orders": 3, "total_sales": "1500.50", "total_items": 7}
        ]}))
        .unwrap();
        assert_eq!(wrapped[0].total_sales, Money::from_cents(150050));

        let nothing: Vec<Alert> = list_from_value(Value::Null).unwrap();
        assert!(nothing.is_empty());
        let odd: Vec<Alert> = list_from_value(json!({"data": "oops"})).unwrap();
        assert!(odd.is_empty());
    }

    #[test]
    fn test_bad_element_is_decode_error() {
        let err = list_from_value::<Customer>(json!([{"nombre": 5}])).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message": "Stock insuficiente"}"#),
            Some("Stock insuficiente".to_string())
        );
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message(r#"{"error": "x"}"#), None);
    }

    #[test]
    fn test_page_request() {
        assert_eq!(PageRequest::page(2, 24), PageRequest { limit: 24, offset: 48 });
        assert_eq!(
            search_query(Some("vacuna"), Some(PageRequest::first(40))),
            vec![("q", "vacuna".to_string()), ("limit", "40".to_string())]
        );
        assert!(search_query(None, None).is_empty());
    }

    #[test]
    fn test_payment_body() {
        let body = PaymentRequest {
            sale_id: 9,
            customer_id: Some(4),
            amount: Money::from_major(250),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"saleId": 9, "customerId": 4, "amount": 250})
        );
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_request() {
        let config = ClientConfig::default();
        let backend = HttpBackend::new(&config, Arc::new(SessionStore::in_memory())).unwrap();
        let err = backend.list_alerts().await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated));
    }
}
