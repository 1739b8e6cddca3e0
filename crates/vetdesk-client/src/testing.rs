//! In-memory backend shared by the view-object tests. Built for downstream
//! crates with the `testing` feature.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{AlertsApi, AuthApi, CatalogApi, CustomerApi, PageRequest, PaymentRequest, ReportsApi, SalesApi};
use crate::error::{ClientError, ClientResult};
use vetdesk_core::forms::{CustomerInput, ProductInput, ServiceInput};
use vetdesk_core::{Alert, Customer, Money, Product, ProfitMonth, Sale, SalePayload, SalesMonth, Service};

#[derive(Default)]
pub struct FakeBackend {
    pub products: Mutex<Vec<Product>>,
    pub services: Mutex<Vec<Service>>,
    pub customers: Mutex<Vec<Customer>>,
    pub sales: Mutex<Vec<Sale>>,
    pub alerts: Mutex<Vec<Alert>>,
    pub sales_months: Mutex<Vec<SalesMonth>>,
    pub profit_months: Mutex<Vec<ProfitMonth>>,
    pub created_sales: Mutex<Vec<SalePayload>>,
    pub payments: Mutex<Vec<PaymentRequest>>,
    delays: Mutex<HashMap<&'static str, Duration>>,
    failures: Mutex<HashMap<&'static str, (u16, Option<String>)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call to `op` fail with `status`.
    pub fn fail_on(&self, op: &'static str, status: u16, message: Option<&str>) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, (status, message.map(str::to_string)));
    }

    pub fn clear_failure(&self, op: &'static str) {
        self.failures.lock().unwrap().remove(op);
    }

    /// Makes every call to `op` take `delay` before answering.
    pub fn delay_on(&self, op: &'static str, delay: Duration) {
        self.delays.lock().unwrap().insert(op, delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(op))
            .count()
    }

    async fn enter(&self, op: &'static str, detail: &str) -> ClientResult<()> {
        self.calls.lock().unwrap().push(format!("{}:{}", op, detail));
        let delay = self.delays.lock().unwrap().get(op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().unwrap().get(op).cloned() {
            Some((status, message)) => Err(ClientError::Http { status, message }),
            None => Ok(()),
        }
    }
}

fn name_matches(nombre: &str, query: Option<&str>) -> bool {
    query.map_or(true, |q| nombre.to_lowercase().contains(&q.to_lowercase()))
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn product(id: i64, nombre: &str, precio: i64, stock: i64) -> Product {
    Product {
        id,
        nombre: nombre.to_string(),
        marca: None,
        descripcion: None,
        categoria: None,
        precio: Money::from_major(precio),
        stock,
        cost: None,
        vencimiento: None,
        imagen: None,
    }
}

pub fn service(id: i64, nombre: &str, precio: i64) -> Service {
    Service {
        id,
        nombre: nombre.to_string(),
        descripcion: None,
        precio: Money::from_major(precio),
        duracion_min: Some(30),
        categoria: None,
    }
}

pub fn customer(id: i64, nombre: &str) -> Customer {
    Customer {
        id,
        nombre: nombre.to_string(),
        email: None,
        telefono: None,
    }
}

pub fn sale(id: i64, customer_id: i64, total: i64) -> Sale {
    Sale {
        id,
        created_at: Some("2024-06-01 10:00:00".to_string()),
        total: Money::from_major(total),
        items: Vec::new(),
        on_credit: true,
        paid_amount: Some(Money::zero()),
        outstanding_amount: Some(Money::from_major(total)),
        customer_id: Some(customer_id),
    }
}

// =============================================================================
// Trait Impls
// =============================================================================

#[async_trait]
impl AuthApi for FakeBackend {
    async fn login(&self, user: &str, _pass: &str) -> ClientResult<String> {
        self.enter("login", user).await?;
        Ok(format!("token-{}", user))
    }
}

#[async_trait]
impl CatalogApi for FakeBackend {
    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        self.enter("list_products", "").await?;
        Ok(self.products.lock().unwrap().clone())
    }

    async fn search_products(&self, query: Option<&str>, page: PageRequest) -> ClientResult<Vec<Product>> {
        self.enter("search_products", query.unwrap_or("")).await?;
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| name_matches(&p.nombre, query))
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn top_products(&self, limit: u32) -> ClientResult<Vec<Product>> {
        self.enter("top_products", &limit.to_string()).await?;
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_services(&self, query: Option<&str>, page: Option<PageRequest>) -> ClientResult<Vec<Service>> {
        self.enter("list_services", query.unwrap_or("")).await?;
        let page = page.unwrap_or(PageRequest::first(u32::MAX));
        Ok(self
            .services
            .lock()
            .unwrap()
            .iter()
            .filter(|s| name_matches(&s.nombre, query))
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn create_product(&self, input: &ProductInput) -> ClientResult<()> {
        self.enter("create_product", &input.nombre).await
    }

    async fn update_product(&self, id: i64, _input: &ProductInput) -> ClientResult<()> {
        self.enter("update_product", &id.to_string()).await
    }

    async fn delete_product(&self, id: i64) -> ClientResult<()> {
        self.enter("delete_product", &id.to_string()).await?;
        self.products.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn create_service(&self, input: &ServiceInput) -> ClientResult<()> {
        self.enter("create_service", &input.nombre).await
    }

    async fn update_service(&self, id: i64, _input: &ServiceInput) -> ClientResult<()> {
        self.enter("update_service", &id.to_string()).await
    }

    async fn delete_service(&self, id: i64) -> ClientResult<()> {
        self.enter("delete_service", &id.to_string()).await?;
        self.services.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }
}

#[async_trait]
impl CustomerApi for FakeBackend {
    async fn list_customers(&self) -> ClientResult<Vec<Customer>> {
        self.enter("list_customers", "").await?;
        Ok(self.customers.lock().unwrap().clone())
    }

    async fn get_customer(&self, id: i64) -> ClientResult<Customer> {
        self.enter("get_customer", &id.to_string()).await?;
        self.customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(ClientError::Http {
                status: 404,
                message: Some("Cliente no encontrado".into()),
            })
    }

    async fn create_customer(&self, input: &CustomerInput) -> ClientResult<()> {
        self.enter("create_customer", &input.nombre).await
    }

    async fn update_customer(&self, id: i64, _input: &CustomerInput) -> ClientResult<()> {
        self.enter("update_customer", &id.to_string()).await
    }

    async fn delete_customer(&self, id: i64) -> ClientResult<()> {
        self.enter("delete_customer", &id.to_string()).await?;
        self.customers.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }

    async fn settle_account(&self, id: i64) -> ClientResult<()> {
        self.enter("settle_account", &id.to_string()).await?;
        self.sales
            .lock()
            .unwrap()
            .retain(|s| s.customer_id != Some(id));
        Ok(())
    }
}

#[async_trait]
impl SalesApi for FakeBackend {
    async fn list_sales(&self, customer_id: Option<i64>) -> ClientResult<Vec<Sale>> {
        let detail = customer_id.map(|id| id.to_string()).unwrap_or_default();
        self.enter("list_sales", &detail).await?;
        Ok(self
            .sales
            .lock()
            .unwrap()
            .iter()
            .filter(|s| customer_id.is_none() || s.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn get_sale(&self, id: i64) -> ClientResult<Sale> {
        self.enter("get_sale", &id.to_string()).await?;
        self.sales
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(ClientError::Http {
                status: 404,
                message: None,
            })
    }

    async fn create_sale(&self, payload: &SalePayload) -> ClientResult<()> {
        self.enter("create_sale", "").await?;
        self.created_sales.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn register_payment(&self, payment: &PaymentRequest) -> ClientResult<()> {
        self.enter("register_payment", &payment.sale_id.to_string())
            .await?;
        for sale in self.sales.lock().unwrap().iter_mut() {
            if sale.id == payment.sale_id {
                sale.outstanding_amount = Some(sale.outstanding() - payment.amount);
            }
        }
        self.payments.lock().unwrap().push(payment.clone());
        Ok(())
    }
}

#[async_trait]
impl AlertsApi for FakeBackend {
    async fn list_alerts(&self) -> ClientResult<Vec<Alert>> {
        self.enter("list_alerts", "").await?;
        Ok(self.alerts.lock().unwrap().clone())
    }

    async fn resolve_alert(&self, id: i64) -> ClientResult<()> {
        self.enter("resolve_alert", &id.to_string()).await?;
        self.alerts.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }
}

#[async_trait]
impl ReportsApi for FakeBackend {
    async fn sales_by_month(&self, from: NaiveDate, to: NaiveDate) -> ClientResult<Vec<SalesMonth>> {
        self.enter("sales_by_month", &format!("{}..{}", from, to))
            .await?;
        Ok(self.sales_months.lock().unwrap().clone())
    }

    async fn profit_by_month(&self, from: NaiveDate, to: NaiveDate) -> ClientResult<Vec<ProfitMonth>> {
        self.enter("profit_by_month", &format!("{}..{}", from, to))
            .await?;
        Ok(self.profit_months.lock().unwrap().clone())
    }
}
