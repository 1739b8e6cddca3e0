//! # Cart
//!
//! The point-of-sale cart: an ordered list of lines, each a product or a
//! service with a quantity.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Cart Method             Effect                │
//! │  ───────────────          ───────────             ──────                │
//! │                                                                         │
//! │  Pick item ──────────────► add_item() ──────────► merge or append      │
//! │                                                   qty clamped to stock  │
//! │                                                                         │
//! │  Type quantity ──────────► update_quantity() ───► coerce ≥1, clamp     │
//! │                                                                         │
//! │  Click remove ───────────► remove_item() ───────► no-op if absent      │
//! │                                                                         │
//! │  Sale recorded ──────────► clear() ─────────────► lines.clear()        │
//! │                                                                         │
//! │  Footer ─────────────────► subtotal(), items_count() (derived)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by key (`p-<id>` / `s-<id>`).
//! - Every line has `qty ≥ 1`.
//! - Product lines have `qty ≤ stock`; every line has `qty ≤ MAX_ITEM_QUANTITY`.
//! - The subtotal fits in `Money`. A change that would overflow it is refused.
//! - Insertion order is display order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CatalogItem, ItemKind};
use crate::validation::coerce_quantity;
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the cart.
///
/// `precio` is frozen when the line is created, so a price edit in the
/// catalog does not change what the operator already sees in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    /// `<p|s>-<id>`
    pub key: String,

    #[ts(type = "number")]
    pub id: i64,

    #[serde(rename = "type")]
    pub kind: ItemKind,

    pub nombre: String,

    #[ts(type = "number")]
    pub precio: Money,

    #[ts(type = "number")]
    pub qty: i64,

    /// Quantity ceiling. `None` for services.
    #[ts(type = "number | null")]
    pub stock: Option<i64>,
}

impl CartLine {
    fn from_item(item: &CatalogItem, qty: i64) -> Self {
        CartLine {
            key: item.key(),
            id: item.id(),
            kind: item.kind(),
            nombre: item.nombre().to_string(),
            precio: item.precio(),
            qty,
            stock: item.stock_limit(),
        }
    }

    /// precio × qty
    pub fn line_total(&self) -> Money {
        self.precio.multiply_quantity(self.qty)
    }

    fn checked_total(&self) -> CoreResult<Money> {
        self.precio
            .checked_mul(self.qty)
            .ok_or(CoreError::AmountOutOfRange)
    }

    fn clamp(&self, qty: i64) -> i64 {
        let ceiling = match self.stock {
            Some(limit) => limit.min(MAX_ITEM_QUANTITY),
            None => MAX_ITEM_QUANTITY,
        };
        qty.min(ceiling).max(1)
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds `qty` of a catalog item, merging with an existing line.
    ///
    /// ## Rules
    /// - `qty` must be at least 1.
    /// - A product with `stock ≤ 0` is rejected with [`CoreError::OutOfStock`]
    ///   and the cart is left untouched.
    /// - Merging sets `qty = min(existing + qty, stock)`.
    /// - A new line is clamped to stock as well.
    /// - No line goes above [`MAX_ITEM_QUANTITY`].
    /// - If the new subtotal would overflow, the cart is left untouched and
    ///   [`CoreError::AmountOutOfRange`] is returned.
    ///
    /// ## Example
    /// ```rust
    /// use vetdesk_core::cart::Cart;
    /// use vetdesk_core::money::Money;
    /// use vetdesk_core::types::{CatalogItem, Product};
    ///
    /// let collar = CatalogItem::Product(Product {
    ///     id: 5,
    ///     nombre: "Collar".into(),
    ///     marca: None,
    ///     descripcion: None,
    ///     categoria: None,
    ///     precio: Money::from_major(300),
    ///     stock: 2,
    ///     cost: None,
    ///     vencimiento: None,
    ///     imagen: None,
    /// });
    ///
    /// let mut cart = Cart::new();
    /// cart.add_item(&collar, 1).unwrap();
    /// cart.add_item(&collar, 2).unwrap();
    /// assert_eq!(cart.line("p-5").unwrap().qty, 2); // clamped to stock
    /// ```
    pub fn add_item(&mut self, item: &CatalogItem, qty: i64) -> CoreResult<&CartLine> {
        if qty < 1 {
            return Err(ValidationError::MustBePositive {
                field: "qty".to_string(),
            }
            .into());
        }

        if let Some(stock) = item.stock_limit() {
            if stock <= 0 {
                return Err(CoreError::OutOfStock {
                    nombre: item.nombre().to_string(),
                });
            }
        }

        let key = item.key();
        let index = match self.lines.iter().position(|l| l.key == key) {
            Some(index) => {
                let previous = self.lines[index].clone();
                let line = &mut self.lines[index];
                line.stock = item.stock_limit();
                line.qty = line.clamp(line.qty.saturating_add(qty));
                if let Err(e) = self.checked_subtotal() {
                    self.lines[index] = previous;
                    return Err(e);
                }
                index
            }
            None => {
                let mut line = CartLine::from_item(item, qty);
                line.qty = line.clamp(qty);
                self.lines.push(line);
                if let Err(e) = self.checked_subtotal() {
                    self.lines.pop();
                    return Err(e);
                }
                self.lines.len() - 1
            }
        };

        Ok(&self.lines[index])
    }

    /// Applies a quantity typed by the operator.
    ///
    /// Input is coerced to an integer ≥ 1 (junk becomes 1) and then clamped
    /// to the line's stock. Returns the quantity actually stored.
    pub fn update_quantity(&mut self, key: &str, raw: &str) -> CoreResult<i64> {
        self.set_quantity(key, coerce_quantity(raw))
    }

    /// Sets a numeric quantity, with the same clamping as [`Cart::update_quantity`].
    pub fn set_quantity(&mut self, key: &str, qty: i64) -> CoreResult<i64> {
        let index = self
            .lines
            .iter()
            .position(|l| l.key == key)
            .ok_or_else(|| CoreError::LineNotFound(key.to_string()))?;

        let previous = self.lines[index].qty;
        let clamped = self.lines[index].clamp(qty);
        self.lines[index].qty = clamped;
        if let Err(e) = self.checked_subtotal() {
            self.lines[index].qty = previous;
            return Err(e);
        }
        Ok(clamped)
    }

    /// Removes a line. Returns false (and changes nothing) if absent.
    pub fn remove_item(&mut self, key: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.key != key);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, key: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Σ qty
    pub fn items_count(&self) -> i64 {
        self.lines.iter().map(|l| l.qty).sum()
    }

    /// Σ precio × qty
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Like [`Cart::subtotal`], but fails instead of saturating.
    pub fn checked_subtotal(&self) -> CoreResult<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, line| {
            acc.checked_add(line.checked_total()?)
                .ok_or(CoreError::AmountOutOfRange)
        })
    }
}

/// Cart footer summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    #[ts(type = "number")]
    pub items_count: i64,
    #[ts(type = "number")]
    pub subtotal: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            items_count: cart.items_count(),
            subtotal: cart.subtotal(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Product, Service};

    fn product(id: i64, precio: i64, stock: i64) -> CatalogItem {
        CatalogItem::Product(Product {
            id,
            nombre: format!("Producto {}", id),
            marca: None,
            descripcion: None,
            categoria: None,
            precio: Money::from_major(precio),
            stock,
            cost: None,
            vencimiento: None,
            imagen: None,
        })
    }

    fn service(id: i64, precio: i64) -> CatalogItem {
        CatalogItem::Service(Service {
            id,
            nombre: format!("Servicio {}", id),
            descripcion: None,
            precio: Money::from_major(precio),
            duracion_min: Some(30),
            categoria: None,
        })
    }

    #[test]
    fn test_add_out_of_stock_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add_item(&product(1, 100, 3), 1).unwrap();
        let before = cart.clone();

        let err = cart.add_item(&product(2, 100, 0), 1).unwrap_err();

        assert!(matches!(err, CoreError::OutOfStock { .. }));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_same_item_merges_lines() {
        let mut cart = Cart::new();
        let item = product(5, 100, 10);

        cart.add_item(&item, 1).unwrap();
        cart.add_item(&item, 2).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.line("p-5").unwrap().qty, 3);
    }

    #[test]
    fn test_merge_clamps_to_stock() {
        let mut cart = Cart::new();
        let item = product(5, 100, 2);

        cart.add_item(&item, 1).unwrap();
        cart.add_item(&item, 2).unwrap();

        assert_eq!(cart.line("p-5").unwrap().qty, 2);
    }

    #[test]
    fn test_first_insert_clamps_to_stock() {
        let mut cart = Cart::new();
        cart.add_item(&product(1, 100, 4), 10).unwrap();
        assert_eq!(cart.items_count(), 4);
    }

    #[test]
    fn test_services_are_unbounded() {
        let mut cart = Cart::new();
        let bath = service(1, 50);
        cart.add_item(&bath, 500).unwrap();
        cart.add_item(&bath, 500).unwrap();
        assert_eq!(cart.line("s-1").unwrap().qty, 1000);
    }

    #[test]
    fn test_huge_service_quantity_is_capped() {
        let mut cart = Cart::new();
        cart.add_item(&service(1, 50), 1).unwrap();

        assert_eq!(cart.update_quantity("s-1", "1e30").unwrap(), MAX_ITEM_QUANTITY);
        assert_eq!(cart.line("s-1").unwrap().qty, MAX_ITEM_QUANTITY);
        assert_eq!(cart.subtotal(), Money::from_major(50 * MAX_ITEM_QUANTITY));
        assert_eq!(cart.checked_subtotal(), Ok(cart.subtotal()));

        cart.add_item(&service(1, 50), i64::MAX).unwrap();
        assert_eq!(cart.line("s-1").unwrap().qty, MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_overflowing_total_is_refused() {
        let mut cart = Cart::new();
        let pricey = CatalogItem::Service(Service {
            id: 9,
            nombre: "Cirugía".to_string(),
            descripcion: None,
            precio: Money::from_cents(i64::MAX / 2),
            duracion_min: None,
            categoria: None,
        });
        cart.add_item(&pricey, 1).unwrap();

        assert_eq!(cart.set_quantity("s-9", 3), Err(CoreError::AmountOutOfRange));
        assert_eq!(cart.line("s-9").unwrap().qty, 1);

        assert_eq!(
            cart.add_item(&pricey, 2).map(|l| l.qty),
            Err(CoreError::AmountOutOfRange)
        );
        assert_eq!(cart.line("s-9").unwrap().qty, 1);

        let mut other = pricey.clone();
        if let CatalogItem::Service(s) = &mut other {
            s.id = 10;
        }
        assert!(cart.add_item(&other, 2).is_err());
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn test_product_and_service_with_same_id_are_distinct() {
        let mut cart = Cart::new();
        cart.add_item(&product(7, 100, 5), 1).unwrap();
        cart.add_item(&service(7, 200), 1).unwrap();

        let keys: Vec<&str> = cart.lines().iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, vec!["p-7", "s-7"]);
    }

    #[test]
    fn test_add_rejects_non_positive_qty() {
        let mut cart = Cart::new();
        assert!(cart.add_item(&product(1, 100, 5), 0).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_coerces_and_clamps() {
        let mut cart = Cart::new();
        cart.add_item(&product(1, 100, 5), 1).unwrap();

        assert_eq!(cart.update_quantity("p-1", "abc").unwrap(), 1);
        assert_eq!(cart.update_quantity("p-1", "0").unwrap(), 1);
        assert_eq!(cart.update_quantity("p-1", "3").unwrap(), 3);
        assert_eq!(cart.update_quantity("p-1", "99").unwrap(), 5);
        assert!(cart.update_quantity("p-404", "2").is_err());
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(&product(1, 100, 5), 1).unwrap();
        assert!(!cart.remove_item("s-1"));
        assert!(cart.remove_item("p-1"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_aggregates_hold_after_mixed_operations() {
        let mut cart = Cart::new();
        cart.add_item(&product(1, 500, 10), 2).unwrap();
        cart.add_item(&service(2, 300), 1).unwrap();
        cart.add_item(&product(3, 120, 1), 1).unwrap();
        cart.update_quantity("s-2", "4").unwrap();
        cart.remove_item("p-3");

        let expected_count: i64 = cart.lines().iter().map(|l| l.qty).sum();
        let expected_subtotal: Money = cart.lines().iter().map(|l| l.precio * l.qty).sum();
        assert_eq!(cart.items_count(), expected_count);
        assert_eq!(cart.subtotal(), expected_subtotal);
        assert_eq!(cart.subtotal(), Money::from_major(2200));

        let totals = CartTotals::from(&cart);
        assert_eq!(totals.line_count, 2);
        assert_eq!(totals.items_count, 6);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(&product(1, 100, 5), 1).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::zero());
    }
}
