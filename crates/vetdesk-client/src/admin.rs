//! # Catalog & Customer Administration
//!
//! List views with create, update and delete for products (warehouse),
//! services and customers, plus the read-only sales history.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  form.validate() ── error ──► notice, nothing sent                     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  id? ── Some ──► PUT /api/<kind>/:id                                   │
//! │        └─ None ─► POST /api/<kind>                                     │
//! │        │                                                                │
//! │        ├── error ──► notice (backend message or "Could not save")      │
//! │        ▼                                                                │
//! │  success notice ──► re-fetch the list                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deletes ask first and drop the row locally once the backend agrees.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{CatalogApi, CustomerApi, SalesApi};
use crate::error::{ClientError, ClientResult};
use crate::notify::{Confirmer, Notifier};
use vetdesk_core::forms::{CustomerForm, ProductForm, ServiceForm};
use vetdesk_core::{Customer, Product, Sale, Service, ValidationError};

const SAVE_FAILED: &str = "Could not save";
const DELETE_FAILED: &str = "Could not delete";

fn reject(notifier: &dyn Notifier, e: ValidationError) -> ClientError {
    notifier.error(&e.to_string());
    e.into()
}

fn contains_ci(fields: &[Option<&str>], query: &str) -> bool {
    let q = query.trim().to_lowercase();
    q.is_empty()
        || fields
            .iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&q))
}

// =============================================================================
// Products (warehouse)
// =============================================================================

pub struct ProductAdmin {
    api: Arc<dyn CatalogApi>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    products: Vec<Product>,
    query: String,
    only_out_of_stock: bool,
}

impl ProductAdmin {
    pub fn new(api: Arc<dyn CatalogApi>, notifier: Arc<dyn Notifier>, confirmer: Arc<dyn Confirmer>) -> Self {
        ProductAdmin {
            api,
            notifier,
            confirmer,
            products: Vec::new(),
            query: String::new(),
            only_out_of_stock: false,
        }
    }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        match self.api.list_products().await {
            Ok(products) => {
                debug!(count = products.len(), "Products loaded");
                self.products = products;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load products");
                self.notifier.error("Could not load the products");
                Err(e)
            }
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn set_only_out_of_stock(&mut self, only: bool) {
        self.only_out_of_stock = only;
    }

    /// Products matching the query on name, brand, description or category.
    pub fn visible(&self) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| !self.only_out_of_stock || p.stock <= 0)
            .filter(|p| {
                contains_ci(
                    &[
                        Some(p.nombre.as_str()),
                        p.marca.as_deref(),
                        p.descripcion.as_deref(),
                        p.categoria.as_deref(),
                    ],
                    &self.query,
                )
            })
            .collect()
    }

    /// Creates (`id == None`) or updates a product, then re-fetches.
    pub async fn save(&mut self, id: Option<i64>, form: &ProductForm) -> ClientResult<()> {
        let input = form
            .validate()
            .map_err(|e| reject(self.notifier.as_ref(), e))?;

        let result = match id {
            Some(id) => self.api.update_product(id, &input).await,
            None => self.api.create_product(&input).await,
        };
        if let Err(e) = result {
            warn!(?id, error = %e, "Failed to save product");
            self.notifier.error(&e.user_message(SAVE_FAILED));
            return Err(e);
        }

        info!(?id, nombre = %input.nombre, "Product saved");
        self.notifier
            .success(if id.is_some() { "Product updated" } else { "Product created" });
        self.refresh().await
    }

    /// Returns `Ok(false)` when the operator declines.
    pub async fn delete(&mut self, id: i64) -> ClientResult<bool> {
        if !self.confirmer.confirm("Delete this product?").await {
            return Ok(false);
        }
        if let Err(e) = self.api.delete_product(id).await {
            warn!(product_id = id, error = %e, "Failed to delete product");
            self.notifier.error(&e.user_message(DELETE_FAILED));
            return Err(e);
        }
        self.products.retain(|p| p.id != id);
        self.notifier.success("Product deleted");
        Ok(true)
    }
}

// =============================================================================
// Services
// =============================================================================

pub struct ServiceAdmin {
    api: Arc<dyn CatalogApi>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    services: Vec<Service>,
    query: String,
}

impl ServiceAdmin {
    pub fn new(api: Arc<dyn CatalogApi>, notifier: Arc<dyn Notifier>, confirmer: Arc<dyn Confirmer>) -> Self {
        ServiceAdmin {
            api,
            notifier,
            confirmer,
            services: Vec::new(),
            query: String::new(),
        }
    }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        match self.api.list_services(None, None).await {
            Ok(services) => {
                self.services = services;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load services");
                self.notifier.error("Could not load the services");
                Err(e)
            }
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn visible(&self) -> Vec<&Service> {
        self.services
            .iter()
            .filter(|s| {
                contains_ci(
                    &[
                        Some(s.nombre.as_str()),
                        s.descripcion.as_deref(),
                        s.categoria.as_deref(),
                    ],
                    &self.query,
                )
            })
            .collect()
    }

    pub async fn save(&mut self, id: Option<i64>, form: &ServiceForm) -> ClientResult<()> {
        let input = form
            .validate()
            .map_err(|e| reject(self.notifier.as_ref(), e))?;

        let result = match id {
            Some(id) => self.api.update_service(id, &input).await,
            None => self.api.create_service(&input).await,
        };
        if let Err(e) = result {
            warn!(?id, error = %e, "Failed to save service");
            self.notifier.error(&e.user_message(SAVE_FAILED));
            return Err(e);
        }

        info!(?id, nombre = %input.nombre, "Service saved");
        self.notifier
            .success(if id.is_some() { "Service updated" } else { "Service created" });
        self.refresh().await
    }

    pub async fn delete(&mut self, id: i64) -> ClientResult<bool> {
        let prompt = "Delete this service? This cannot be undone.";
        if !self.confirmer.confirm(prompt).await {
            return Ok(false);
        }
        if let Err(e) = self.api.delete_service(id).await {
            warn!(service_id = id, error = %e, "Failed to delete service");
            self.notifier.error(&e.user_message(DELETE_FAILED));
            return Err(e);
        }
        self.services.retain(|s| s.id != id);
        self.notifier.success("Service deleted");
        Ok(true)
    }
}

// =============================================================================
// Customers
// =============================================================================

pub struct CustomerAdmin {
    api: Arc<dyn CustomerApi>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    customers: Vec<Customer>,
    query: String,
}

impl CustomerAdmin {
    pub fn new(api: Arc<dyn CustomerApi>, notifier: Arc<dyn Notifier>, confirmer: Arc<dyn Confirmer>) -> Self {
        CustomerAdmin {
            api,
            notifier,
            confirmer,
            customers: Vec::new(),
            query: String::new(),
        }
    }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        match self.api.list_customers().await {
            Ok(customers) => {
                self.customers = customers;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load customers");
                self.notifier.error("Could not load the customers");
                Err(e)
            }
        }
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn find(&self, id: i64) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    /// Name, email or phone contains the query.
    pub fn visible(&self) -> Vec<&Customer> {
        self.customers
            .iter()
            .filter(|c| c.matches(&self.query))
            .collect()
    }

    pub async fn save(&mut self, id: Option<i64>, form: &CustomerForm) -> ClientResult<()> {
        let input = form
            .validate()
            .map_err(|e| reject(self.notifier.as_ref(), e))?;

        let result = match id {
            Some(id) => self.api.update_customer(id, &input).await,
            None => self.api.create_customer(&input).await,
        };
        if let Err(e) = result {
            warn!(?id, error = %e, "Failed to save customer");
            self.notifier.error(&e.user_message(SAVE_FAILED));
            return Err(e);
        }

        info!(?id, nombre = %input.nombre, "Customer saved");
        self.notifier
            .success(if id.is_some() { "Customer updated" } else { "Customer created" });
        self.refresh().await
    }

    pub async fn delete(&mut self, id: i64) -> ClientResult<bool> {
        if !self.confirmer.confirm("Delete customer?").await {
            return Ok(false);
        }
        if let Err(e) = self.api.delete_customer(id).await {
            warn!(customer_id = id, error = %e, "Failed to delete customer");
            self.notifier.error(&e.user_message(DELETE_FAILED));
            return Err(e);
        }
        self.notifier.success("Customer deleted");
        self.refresh().await.map(|_| true)
    }
}

// =============================================================================
// Sales History
// =============================================================================

pub struct SalesHistory {
    api: Arc<dyn SalesApi>,
    notifier: Arc<dyn Notifier>,
    sales: Vec<Sale>,
    query: String,
}

impl SalesHistory {
    pub fn new(api: Arc<dyn SalesApi>, notifier: Arc<dyn Notifier>) -> Self {
        SalesHistory {
            api,
            notifier,
            sales: Vec::new(),
            query: String::new(),
        }
    }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        match self.api.list_sales(None).await {
            Ok(sales) => {
                self.sales = sales;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load sales history");
                self.notifier.error("Could not load the sales");
                Err(e)
            }
        }
    }

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    /// Sales whose total or any item name contains the query.
    pub fn visible(&self) -> Vec<&Sale> {
        self.sales.iter().filter(|s| s.matches(&self.query)).collect()
    }

    pub async fn detail(&self, id: i64) -> ClientResult<Sale> {
        self.api.get_sale(id).await.map_err(|e| {
            self.notifier.error("Could not load the sale detail");
            e
        })
    }
}
