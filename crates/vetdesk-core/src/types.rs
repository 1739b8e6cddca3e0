//! # Domain Types
//!
//! Snapshots of backend entities as the console sees them.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │      Sale       │   │     Alert       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Product        │   │  id             │   │  id             │       │
//! │  │   id, stock     │   │  total          │   │  kind           │       │
//! │  │  Service        │   │  items[]        │   │  message        │       │
//! │  │   id, duracion  │   │  on_credit      │   │  meta (union)   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │   SalesMonth    │   │  ProfitMonth    │       │
//! │  │  id, nombre     │   │  month, orders  │   │  revenue, cogs  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Ids are backend integers. A product and a service may share the same
//! numeric id, so catalog identity is always the `(kind, id)` pair.
//!
//! ## Ingestion Boundary
//! The backend is loose about number encoding (`"5"` vs `5`, `0/1` vs
//! `false/true`) and about `alert.meta` (object or JSON text). All of that
//! is normalized here during deserialization; downstream code only sees
//! typed values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Item Kind
// =============================================================================

/// Which half of the catalog an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Product,
    Service,
}

impl ItemKind {
    /// Prefix used in cart line keys (`p-5`, `s-5`).
    pub const fn key_prefix(&self) -> char {
        match self {
            ItemKind::Product => 'p',
            ItemKind::Service => 's',
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Product => "product",
            ItemKind::Service => "service",
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A physical product with stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    #[ts(type = "number")]
    pub id: i64,

    pub nombre: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marca: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,

    /// Sale price.
    #[ts(type = "number")]
    pub precio: Money,

    /// Units on hand. Missing or non-numeric stock reads as zero.
    #[serde(default, deserialize_with = "lenient::int")]
    #[ts(type = "number")]
    pub stock: i64,

    /// Purchase cost (feeds COGS on the backend).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub cost: Option<Money>,

    /// Expiry date, `YYYY-MM-DD`.
    #[serde(default, alias = "fecha_vencimiento", skip_serializing_if = "Option::is_none")]
    pub vencimiento: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
}

/// A service (consultation, grooming, ...). Services have no stock bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Service {
    #[ts(type = "number")]
    pub id: i64,

    pub nombre: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,

    #[ts(type = "number")]
    pub precio: Money,

    /// Duration in minutes.
    #[serde(
        default,
        deserialize_with = "lenient::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(type = "number | null")]
    pub duracion_min: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
}

/// Either half of the catalog, as picked on the point-of-sale screen.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogItem {
    Product(Product),
    Service(Service),
}

impl CatalogItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            CatalogItem::Product(_) => ItemKind::Product,
            CatalogItem::Service(_) => ItemKind::Service,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            CatalogItem::Product(p) => p.id,
            CatalogItem::Service(s) => s.id,
        }
    }

    pub fn nombre(&self) -> &str {
        match self {
            CatalogItem::Product(p) => &p.nombre,
            CatalogItem::Service(s) => &s.nombre,
        }
    }

    pub fn precio(&self) -> Money {
        match self {
            CatalogItem::Product(p) => p.precio,
            CatalogItem::Service(s) => s.precio,
        }
    }

    /// Upper bound for the quantity of this item in a cart.
    ///
    /// `None` means unbounded (services).
    pub fn stock_limit(&self) -> Option<i64> {
        match self {
            CatalogItem::Product(p) => Some(p.stock),
            CatalogItem::Service(_) => None,
        }
    }

    /// Cart line key, `<p|s>-<id>`.
    pub fn key(&self) -> String {
        line_key(self.kind(), self.id())
    }
}

impl From<Product> for CatalogItem {
    fn from(p: Product) -> Self {
        CatalogItem::Product(p)
    }
}

impl From<Service> for CatalogItem {
    fn from(s: Service) -> Self {
        CatalogItem::Service(s)
    }
}

/// Builds the cart line key for a catalog identity.
pub fn line_key(kind: ItemKind, id: i64) -> String {
    format!("{}-{}", kind.key_prefix(), id)
}

// =============================================================================
// Customer
// =============================================================================

/// A customer who may carry an account balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    #[ts(type = "number")]
    pub id: i64,

    pub nombre: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
}

impl Customer {
    /// Case-insensitive match on name, email or phone.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        [Some(&self.nombre), self.email.as_ref(), self.telefono.as_ref()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&q))
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale summary or detail as returned by `/api/sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default)]
    pub total: Money,

    #[serde(default)]
    pub items: Vec<SaleItem>,

    /// Recorded as unpaid when created.
    #[serde(default, deserialize_with = "lenient::flag")]
    pub on_credit: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Money>,

    #[serde(default, alias = "outstanding", skip_serializing_if = "Option::is_none")]
    pub outstanding_amount: Option<Money>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_id: Option<i64>,
}

impl Sale {
    /// Amount still owed on this sale, zero when unknown.
    pub fn outstanding(&self) -> Money {
        self.outstanding_amount.unwrap_or_default()
    }

    pub fn created(&self) -> Option<NaiveDateTime> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// History search: total as text, or any item name (case-insensitive).
    pub fn matches(&self, query: &str) -> bool {
        let term = query.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        plain_amount(self.total).contains(&term)
            || self
                .items
                .iter()
                .any(|item| item.display_name().to_lowercase().contains(&term))
    }
}

/// One line of a sale detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub id: Option<i64>,

    #[serde(default)]
    pub nombre: Option<String>,

    #[serde(default, deserialize_with = "lenient::int")]
    pub qty: i64,

    #[serde(default, alias = "unit_price")]
    pub precio_unitario: Money,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_total: Option<Money>,
}

impl SaleItem {
    pub fn display_name(&self) -> &str {
        self.nombre.as_deref().unwrap_or("Unnamed item")
    }

    /// Backend line total, or unit price × qty when absent.
    pub fn line_total(&self) -> Money {
        self.line_total
            .unwrap_or_else(|| self.precio_unitario.multiply_quantity(self.qty))
    }
}

// =============================================================================
// Alert
// =============================================================================

/// Alert category as sent by the backend in `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertKind {
    Expiry,
    Stock,
    Other(String),
}

impl From<String> for AlertKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "expiry" => AlertKind::Expiry,
            "stock" => AlertKind::Stock,
            _ => AlertKind::Other(value),
        }
    }
}

impl From<AlertKind> for String {
    fn from(kind: AlertKind) -> Self {
        match kind {
            AlertKind::Expiry => "expiry".to_string(),
            AlertKind::Stock => "stock".to_string(),
            AlertKind::Other(other) => other,
        }
    }
}

/// Alert metadata, resolved once at ingestion.
///
/// ```text
///   meta: null / missing           ──► Empty
///   meta: {"vencimiento": ...}     ──► Fields(map)
///   meta: "{\"stock_low\": true}"  ──► Fields(map)   (JSON text parsed)
///   meta: "lote 42"                ──► Text("lote 42")
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AlertMeta {
    #[default]
    Empty,
    Fields(Map<String, Value>),
    Text(String),
}

impl AlertMeta {
    /// Resolves a raw `meta` value from the backend.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => AlertMeta::Empty,
            Value::Object(map) => AlertMeta::Fields(map),
            Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => AlertMeta::Fields(map),
                _ => AlertMeta::Text(raw),
            },
            other => AlertMeta::Text(other.to_string()),
        }
    }

    fn field(&self, name: &str) -> Option<&Value> {
        match self {
            AlertMeta::Fields(map) => map.get(name),
            _ => None,
        }
    }

    /// Embedded expiry date text, if any.
    pub fn vencimiento(&self) -> Option<String> {
        match self.field("vencimiento")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Truthy `stock_low` flag.
    pub fn stock_low(&self) -> bool {
        self.field("stock_low").map(is_truthy).unwrap_or(false)
    }
}

impl<'de> Deserialize<'de> for AlertMeta {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(AlertMeta::from_value)
    }
}

impl Serialize for AlertMeta {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AlertMeta::Empty => serializer.serialize_none(),
            AlertMeta::Fields(map) => map.serialize(serializer),
            AlertMeta::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// An inventory alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,

    #[serde(rename = "type")]
    pub kind: AlertKind,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub meta: AlertMeta,

    /// Some backends put the expiry date on the alert itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vencimiento: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Alert {
    /// Expiry date from `meta.vencimiento`, falling back to the alert field.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.meta
            .vencimiento()
            .or_else(|| self.vencimiento.clone())
            .as_deref()
            .and_then(parse_date)
    }

    pub fn is_low_stock(&self) -> bool {
        self.kind == AlertKind::Stock || self.meta.stock_low()
    }

    pub fn created(&self) -> Option<NaiveDateTime> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

// =============================================================================
// Reports
// =============================================================================

/// One month of `/api/reports/sales-by-month`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesMonth {
    /// `YYYY-MM`
    pub month: String,

    #[serde(default, deserialize_with = "lenient::int")]
    pub orders: i64,

    #[serde(default)]
    pub total_sales: Money,

    #[serde(default, deserialize_with = "lenient::int")]
    pub total_items: i64,
}

/// One month of `/api/reports/profit-by-month`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitMonth {
    pub month: String,

    #[serde(default)]
    pub revenue: Money,

    #[serde(default)]
    pub cogs: Money,

    #[serde(default)]
    pub profit: Money,
}

// =============================================================================
// Helpers
// =============================================================================

/// Parses a date as `YYYY-MM-DD`, accepting a trailing time part.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Parses the timestamp shapes the backend emits (RFC 3339, SQL datetime, date).
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    parse_date(trimmed).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Amount as plain text, the way it reads in a CSV cell or a search box:
/// `1500`, `1500.5`.
pub fn plain_amount(amount: Money) -> String {
    if amount.cents() % 100 == 0 {
        amount.major().to_string()
    } else {
        amount.to_major_f64().to_string()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Deserializers for loosely typed backend numbers.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_int(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(to_int).unwrap_or(0))
    }

    pub fn opt_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(to_int))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(match value {
            Some(Value::Bool(b)) => b,
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "TRUE" | "True"),
            _ => false,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_line_keys_distinguish_kinds() {
        assert_eq!(line_key(ItemKind::Product, 5), "p-5");
        assert_eq!(line_key(ItemKind::Service, 5), "s-5");
    }

    #[test]
    fn test_product_lenient_fields() {
        let product: Product = serde_json::from_value(json!({
            "id": 3,
            "nombre": "Alimento 15kg",
            "precio": "25000.50",
            "stock": "7",
            "fecha_vencimiento": "2025-01-31"
        }))
        .unwrap();
        assert_eq!(product.precio, Money::from_cents(2_500_050));
        assert_eq!(product.stock, 7);
        assert_eq!(product.vencimiento.as_deref(), Some("2025-01-31"));
    }

    #[test]
    fn test_sale_on_credit_accepts_integer_flag() {
        let sale: Sale = serde_json::from_value(json!({
            "id": 1, "total": 1000, "on_credit": 1, "outstanding_amount": "400"
        }))
        .unwrap();
        assert!(sale.on_credit);
        assert_eq!(sale.outstanding(), Money::from_major(400));
        assert!(sale.items.is_empty());
    }

    #[test]
    fn test_sale_matches_total_or_item_name() {
        let sale: Sale = serde_json::from_value(json!({
            "id": 1, "total": 1500,
            "items": [{"nombre": "Vacuna Triple", "qty": 1, "precio_unitario": 1500}]
        }))
        .unwrap();
        assert!(sale.matches("150"));
        assert!(sale.matches("vacuna"));
        assert!(!sale.matches("collar"));
        assert!(sale.matches("  "));
    }

    #[test]
    fn test_sale_item_line_total_fallback() {
        let item: SaleItem =
            serde_json::from_value(json!({"qty": 3, "unit_price": 200})).unwrap();
        assert_eq!(item.line_total(), Money::from_major(600));
        assert_eq!(item.display_name(), "Unnamed item");
    }

    #[test]
    fn test_alert_meta_resolution() {
        assert_eq!(AlertMeta::from_value(Value::Null), AlertMeta::Empty);

        let parsed = AlertMeta::from_value(json!("{\"vencimiento\":\"2024-03-01\"}"));
        assert_eq!(parsed.vencimiento().as_deref(), Some("2024-03-01"));

        let raw = AlertMeta::from_value(json!("lote 42"));
        assert_eq!(raw, AlertMeta::Text("lote 42".to_string()));
        assert_eq!(raw.vencimiento(), None);

        assert!(AlertMeta::from_value(json!({"stock_low": 1})).stock_low());
        assert!(!AlertMeta::from_value(json!({"stock_low": 0})).stock_low());
    }

    #[test]
    fn test_alert_deserialization() {
        let alert: Alert = serde_json::from_value(json!({
            "id": 9,
            "type": "stock",
            "message": "Stock bajo: Pipeta",
            "meta": "{\"stock_low\": true}",
            "created_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(alert.kind, AlertKind::Stock);
        assert!(alert.is_low_stock());
        assert!(alert.created().is_some());

        let other: Alert =
            serde_json::from_value(json!({"id": 1, "type": "price", "meta": null})).unwrap();
        assert_eq!(other.kind, AlertKind::Other("price".to_string()));
        assert_eq!(other.meta, AlertMeta::Empty);
    }

    #[test]
    fn test_customer_matches() {
        let customer = Customer {
            id: 1,
            nombre: "Ana Pérez".to_string(),
            email: Some("ana@vet.com".to_string()),
            telefono: None,
        };
        assert!(customer.matches("ANA"));
        assert!(customer.matches("vet.com"));
        assert!(!customer.matches("juan"));
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        assert!(parse_timestamp("2024-05-01 10:20:30").is_some());
        assert!(parse_timestamp("2024-05-01T10:20:30.000Z").is_some());
        assert!(parse_timestamp("2024-05-01").is_some());
        assert!(parse_timestamp("ayer").is_none());
    }

    #[test]
    fn test_plain_amount() {
        assert_eq!(plain_amount(Money::from_major(1500)), "1500");
        assert_eq!(plain_amount(Money::from_cents(150050)), "1500.5");
    }
}
