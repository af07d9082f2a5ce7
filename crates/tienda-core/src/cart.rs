//! # Cart
//!
//! The per-session shopping cart and its pricing.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Scan barcode ───────────► add(id) ──────────► qty += 1                │
//! │  Type quantity ──────────► set_quantity() ───► qty = n  (n ≤ 0 drops)  │
//! │  Session file ───────────► Deserialize ──────► duplicate ids merged    │
//! │  Clear / Cancel ─────────► clear() ──────────► lines.clear()           │
//! │                                                                         │
//! │  Show cart / Checkout ───► compute_totals(catalog, rate)               │
//! │                             │                                           │
//! │                             ├─ look up CURRENT price of each line       │
//! │                             ├─ skip lines whose product is gone         │
//! │                             └─ line → subtotal → tax → total            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart only stores product ids and quantities. Prices are read from the
//! catalog every time totals are computed, so a price edit shows up in the
//! cart immediately. Stock is not checked here; checkout does that.
//!
//! Line order is insertion order and is the order checkout scans lines in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Money;
use crate::types::{Product, TaxRate};
use crate::validation::validate_quantity;

/// One cart line: a product id and how many units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product bumps quantity)
/// - Every quantity is ≥ 1
///
/// Both hold for carts read back from JSON too: repeated product ids are
/// summed into the first line and non-positive quantities are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCart")]
pub struct Cart {
    lines: Vec<CartLine>,
}

/// The cart as written to disk, before its invariants are restored.
#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl From<StoredCart> for Cart {
    fn from(stored: StoredCart) -> Self {
        let mut cart = Cart::new();
        for line in stored.lines.into_iter().filter(|l| l.quantity > 0) {
            match cart.lines.iter_mut().find(|l| l.product_id == line.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity)
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds one unit of a product.
    pub fn add(&mut self, product_id: i64) {
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                product_id,
                quantity: 1,
            }),
        }
    }

    /// Sets the exact quantity of a product. `quantity <= 0` removes the line.
    pub fn set_quantity(&mut self, product_id: i64, quantity: i64) {
        if quantity <= 0 {
            self.lines.retain(|l| l.product_id != product_id);
            return;
        }

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Returns the lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns the quantity for a product (0 if absent).
    pub fn quantity_of(&self, product_id: i64) -> i64 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Returns the distinct product ids in the cart.
    pub fn product_ids(&self) -> Vec<i64> {
        self.lines.iter().map(|l| l.product_id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Prices the cart against a catalog snapshot.
    ///
    /// ## Formula
    /// ```text
    /// line     = price × qty            (exact in cents)
    /// subtotal = Σ line
    /// tax      = round(subtotal × rate)  (half-up)
    /// total    = subtotal + tax
    /// ```
    /// Lines whose product is missing from `catalog` are dropped.
    ///
    /// ## Errors
    /// - A line above `MAX_LINE_QUANTITY` units: `CoreError::Validation`
    /// - Any amount past i64 cents: `CoreError::AmountOutOfRange`
    ///
    /// ## Example
    /// ```rust
    /// use std::collections::HashMap;
    /// use chrono::Utc;
    /// use tienda_core::{Cart, Product, TaxRate};
    ///
    /// let now = Utc::now();
    /// let coke = Product {
    ///     id: 1, barcode: "7501031311309".into(), name: "Coca Cola 500ml".into(),
    ///     price_cents: 75, stock: 100, created_at: now, updated_at: now,
    /// };
    /// let catalog = HashMap::from([(coke.id, coke)]);
    ///
    /// let mut cart = Cart::new();
    /// cart.add(1);
    /// cart.add(1);
    ///
    /// let priced = cart.compute_totals(&catalog, TaxRate::parse("0.15").unwrap()).unwrap();
    /// assert_eq!(priced.subtotal.to_string(), "$1.50");
    /// assert_eq!(priced.tax.to_string(), "$0.23");
    /// assert_eq!(priced.total.to_string(), "$1.73");
    /// ```
    pub fn compute_totals(
        &self,
        catalog: &HashMap<i64, Product>,
        tax_rate: TaxRate,
    ) -> Result<PricedCart, CoreError> {
        let mut lines = Vec::with_capacity(self.lines.len());
        let mut subtotal = Money::zero();

        for line in &self.lines {
            let Some(product) = catalog.get(&line.product_id) else {
                continue;
            };
            validate_quantity(line.quantity)?;

            let unit_price = product.price();
            let line_total = unit_price
                .multiply_quantity(line.quantity)
                .ok_or(CoreError::AmountOutOfRange)?;
            subtotal = subtotal
                .checked_add(line_total)
                .ok_or(CoreError::AmountOutOfRange)?;

            lines.push(PricedLine {
                product: product.clone(),
                quantity: line.quantity,
                unit_price,
                line_total,
            });
        }

        let tax = subtotal
            .calculate_tax(tax_rate)
            .ok_or(CoreError::AmountOutOfRange)?;
        let total = subtotal.checked_add(tax).ok_or(CoreError::AmountOutOfRange)?;

        Ok(PricedCart {
            lines,
            subtotal,
            tax,
            total,
            tax_rate,
        })
    }
}

/// A cart line priced at the product's current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product: Product,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// The result of pricing a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub tax_rate: TaxRate,
}

impl PricedCart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines
            .iter()
            .fold(0i64, |acc, l| acc.saturating_add(l.quantity))
    }

    /// First line whose product does not have enough stock, in cart order.
    pub fn first_short_line(&self) -> Option<&PricedLine> {
        self.lines.iter().find(|l| !l.product.can_sell(l.quantity))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i64, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id,
            barcode: format!("BC-{}", id),
            name: format!("Product {}", id),
            price_cents,
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<i64, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    fn rate() -> TaxRate {
        TaxRate::parse("0.15").unwrap()
    }

    #[test]
    fn test_add_increments_quantity() {
        let mut cart = Cart::new();
        cart.add(7);
        cart.add(7);
        cart.add(3);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantity_of(7), 2);
        assert_eq!(cart.quantity_of(3), 1);
        assert_eq!(cart.product_ids(), vec![7, 3]);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::new();
        cart.add(1);
        cart.set_quantity(1, 5);
        assert_eq!(cart.quantity_of(1), 5);

        cart.set_quantity(2, 3);
        assert_eq!(cart.quantity_of(2), 3);

        cart.set_quantity(1, 0);
        assert_eq!(cart.quantity_of(1), 0);
        cart.set_quantity(2, -4);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(1);
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_example_two_cokes() {
        let mut cart = Cart::new();
        cart.set_quantity(1, 2);

        let priced = cart.compute_totals(&catalog(vec![product(1, 75, 100)]), rate()).unwrap();

        assert_eq!(priced.lines[0].line_total.cents(), 150);
        assert_eq!(priced.subtotal.cents(), 150);
        assert_eq!(priced.tax.cents(), 23);
        assert_eq!(priced.total.cents(), 173);
    }

    #[test]
    fn test_missing_products_are_dropped() {
        let mut cart = Cart::new();
        cart.add(1);
        cart.add(99);

        let priced = cart.compute_totals(&catalog(vec![product(1, 165, 5)]), rate()).unwrap();

        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.subtotal.cents(), 165);
        // The cart itself is untouched
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_empty_when_nothing_prices() {
        let mut cart = Cart::new();
        cart.add(42);
        let priced = cart.compute_totals(&HashMap::new(), rate()).unwrap();
        assert!(priced.is_empty());
        assert!(priced.total.is_zero());
    }

    #[test]
    fn test_totals_invariants_hold() {
        let products = vec![
            product(1, 75, 100),
            product(2, 165, 50),
            product(3, 125, 80),
            product(4, 50, 200),
            product(5, 333, 9),
        ];
        let catalog = catalog(products);

        for (a, b, c) in [(1, 0, 0), (3, 1, 7), (2, 2, 2), (11, 5, 13), (1, 9, 1)] {
            let mut cart = Cart::new();
            cart.set_quantity(1, a);
            cart.set_quantity(2, b);
            cart.set_quantity(5, c);
            cart.add(4);

            let priced = cart.compute_totals(&catalog, rate()).unwrap();
            let sum: Money = priced.lines.iter().map(|l| l.line_total).sum();

            assert_eq!(sum, priced.subtotal);
            assert_eq!(priced.total, priced.subtotal + priced.tax);
        }
    }

    #[test]
    fn test_first_short_line_uses_cart_order() {
        let mut cart = Cart::new();
        cart.set_quantity(2, 5);
        cart.set_quantity(1, 2);

        let priced =
            cart.compute_totals(&catalog(vec![product(1, 75, 1), product(2, 50, 3)]), rate())
                .unwrap();

        let short = priced.first_short_line().unwrap();
        assert_eq!(short.product.id, 2);
    }

    #[test]
    fn test_quantity_above_cap_is_rejected() {
        let mut cart = Cart::new();
        cart.set_quantity(1, 5_000_000_000_000_000_000);
        cart.set_quantity(2, 5_000_000_000_000_000_000);

        let err = cart
            .compute_totals(&catalog(vec![product(1, 100, 1), product(2, 100, 1)]), rate())
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_amount_overflow_is_an_error() {
        let mut cart = Cart::new();
        cart.set_quantity(1, 2);
        cart.set_quantity(2, 1);

        let huge = catalog(vec![product(1, i64::MAX / 2, 10), product(2, i64::MAX / 2, 10)]);
        let err = cart.compute_totals(&huge, rate()).unwrap_err();
        assert!(matches!(err, CoreError::AmountOutOfRange));

        // Fits as a subtotal, but not once tax is added
        let mut cart = Cart::new();
        cart.add(3);
        let err = cart
            .compute_totals(&catalog(vec![product(3, i64::MAX - 10, 1)]), rate())
            .unwrap_err();
        assert!(matches!(err, CoreError::AmountOutOfRange));
    }

    #[test]
    fn test_total_quantity_never_overflows() {
        let line = |quantity| PricedLine {
            product: product(1, 0, 0),
            quantity,
            unit_price: Money::zero(),
            line_total: Money::zero(),
        };
        let priced = PricedCart {
            lines: vec![line(i64::MAX), line(i64::MAX)],
            subtotal: Money::zero(),
            tax: Money::zero(),
            total: Money::zero(),
            tax_rate: rate(),
        };
        assert_eq!(priced.total_quantity(), i64::MAX);
    }

    #[test]
    fn test_stored_cart_merges_repeated_products() {
        let json = r#"{"lines":[
            {"product_id":5,"quantity":2},
            {"product_id":8,"quantity":1},
            {"product_id":5,"quantity":2},
            {"product_id":9,"quantity":0}
        ]}"#;

        let cart: Cart = serde_json::from_str(json).unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantity_of(5), 4);
        assert_eq!(cart.quantity_of(9), 0);
        assert_eq!(cart.product_ids(), vec![5, 8]);
    }

    #[test]
    fn test_cart_serializes_for_session_storage() {
        let mut cart = Cart::new();
        cart.set_quantity(4, 3);

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
    }
}
