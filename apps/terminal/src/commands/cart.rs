//! # Cart Commands
//!
//! Cart manipulation for the cashier.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐
//! │  Empty   │────►│ In Cart  │────►│ Customer │────►│ Invoice  │
//! │  Cart    │     │          │     │ prompts  │     │ printed  │
//! └──────────┘     └──────────┘     └──────────┘     └──────────┘
//!                       │                                  │
//!                  add_by_barcode                     checkout
//!                  set_quantity                       (sale.rs)
//!                       │
//!                       ▼
//!                  cancel_sale ─────────────► (back to empty)
//! ```
//!
//! The cart stores only ids and quantities. Every view is priced against the
//! catalog as it is right now, the same way checkout prices it.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use tienda_core::validation::validate_quantity;
use tienda_core::{Money, PricedCart, TaxRate};

use crate::error::ApiError;
use crate::state::{CartState, DbState, StoreConfig};

/// One priced line as shown on screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: i64,
    pub barcode: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
    /// Units on hand right now; below `quantity` means checkout will refuse.
    pub stock: i64,
}

/// Cart response including lines and totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub tax_rate: TaxRate,
    /// Lines whose product no longer exists (dropped from totals)
    pub missing: Vec<i64>,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> i64 {
        self.lines
            .iter()
            .fold(0i64, |acc, l| acc.saturating_add(l.quantity))
    }

    fn from_priced(priced: PricedCart, missing: Vec<i64>) -> Self {
        CartView {
            lines: priced
                .lines
                .into_iter()
                .map(|l| CartLineView {
                    product_id: l.product.id,
                    barcode: l.product.barcode,
                    name: l.product.name,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    line_total: l.line_total,
                    stock: l.product.stock,
                })
                .collect(),
            subtotal: priced.subtotal,
            tax: priced.tax,
            total: priced.total,
            tax_rate: priced.tax_rate,
            missing,
        }
    }
}

/// Gets the current cart, priced at current catalog prices.
pub async fn get_cart(
    db: &DbState,
    cart: &CartState,
    config: &StoreConfig,
) -> Result<CartView, ApiError> {
    let snapshot = cart.snapshot();
    let ids = snapshot.product_ids();

    let catalog: HashMap<_, _> = db
        .inner()
        .products()
        .get_many(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let missing: Vec<i64> = ids.into_iter().filter(|id| !catalog.contains_key(id)).collect();
    let priced = snapshot.compute_totals(&catalog, config.tax_rate)?;

    Ok(CartView::from_priced(priced, missing))
}

/// One more unit of `product_id`, within the per-line cap.
fn add_one(cart: &CartState, product_id: i64) -> Result<(), ApiError> {
    let next = cart.with_cart(|c| c.quantity_of(product_id)).saturating_add(1);
    validate_quantity(next)?;
    cart.with_cart_mut(|c| c.add(product_id))?;
    Ok(())
}

/// Adds one unit of the product with this barcode.
///
/// ## Behavior
/// - Already in cart: quantity increases by one
/// - Unknown barcode: `NOT_FOUND`, cart unchanged
/// - Stock is not checked here; checkout does that
pub async fn add_by_barcode(
    db: &DbState,
    cart: &CartState,
    config: &StoreConfig,
    barcode: &str,
) -> Result<CartView, ApiError> {
    let barcode = barcode.trim();
    debug!(barcode = %barcode, "add_by_barcode command");

    let product = db
        .inner()
        .products()
        .get_by_barcode(barcode)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", barcode))?;

    add_one(cart, product.id)?;

    get_cart(db, cart, config).await
}

/// Adds one unit of the product with this id.
pub async fn add_by_id(
    db: &DbState,
    cart: &CartState,
    config: &StoreConfig,
    product_id: i64,
) -> Result<CartView, ApiError> {
    debug!(product_id, "add_by_id command");

    let product = db
        .inner()
        .products()
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", product_id))?;

    add_one(cart, product.id)?;

    get_cart(db, cart, config).await
}

/// Sets a line's quantity. Zero or less removes the line; more than
/// `MAX_LINE_QUANTITY` is rejected and leaves the cart unchanged.
pub async fn set_quantity(
    db: &DbState,
    cart: &CartState,
    config: &StoreConfig,
    product_id: i64,
    quantity: i64,
) -> Result<CartView, ApiError> {
    debug!(product_id, quantity, "set_quantity command");
    validate_quantity(quantity)?;

    if quantity > 0 && cart.with_cart(|c| c.quantity_of(product_id)) == 0 {
        db.inner()
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", product_id))?;
    }

    cart.with_cart_mut(|c| c.set_quantity(product_id, quantity))?;

    get_cart(db, cart, config).await
}

/// Empties the cart.
pub fn clear_cart(cart: &CartState) -> Result<(), ApiError> {
    debug!("clear_cart command");
    cart.with_cart_mut(|c| c.clear())?;
    Ok(())
}

/// Abandons the sale in progress.
pub fn cancel_sale(cart: &CartState) -> Result<(), ApiError> {
    let lines = cart.with_cart(|c| c.len());
    cart.with_cart_mut(|c| c.clear())?;
    info!(lines, "Sale cancelled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{fixture, product};
    use crate::error::ErrorCode;
    use tienda_core::validation::MAX_LINE_QUANTITY;

    #[tokio::test]
    async fn test_scan_twice_prices_cart() {
        let fx = fixture().await;
        product(&fx, "7501031311309", "Coca Cola 500ml", "0.75", 100).await;

        add_by_barcode(&fx.db, &fx.cart, &fx.config, "7501031311309").await.unwrap();
        let view = add_by_barcode(&fx.db, &fx.cart, &fx.config, " 7501031311309 ")
            .await
            .unwrap();

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 2);
        assert_eq!(view.subtotal.cents(), 150);
        assert_eq!(view.tax.cents(), 23);
        assert_eq!(view.total.cents(), 173);
    }

    #[tokio::test]
    async fn test_unknown_barcode() {
        let fx = fixture().await;

        let err = add_by_barcode(&fx.db, &fx.cart, &fx.config, "0000000000000")
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(fx.cart.with_cart(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_add_by_id() {
        let fx = fixture().await;
        let pan = product(&fx, "7861001240017", "Pan Bimbo", "1.65", 50).await;

        let view = add_by_id(&fx.db, &fx.cart, &fx.config, pan.id).await.unwrap();
        assert_eq!(view.lines[0].name, "Pan Bimbo");

        let err = add_by_id(&fx.db, &fx.cart, &fx.config, 9999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_set_quantity_and_remove() {
        let fx = fixture().await;
        let arroz = product(&fx, "7862104340108", "Arroz 1kg", "1.25", 80).await;

        let view = set_quantity(&fx.db, &fx.cart, &fx.config, arroz.id, 3).await.unwrap();
        assert_eq!(view.item_count(), 3);
        assert_eq!(view.subtotal.cents(), 375);

        let view = set_quantity(&fx.db, &fx.cart, &fx.config, arroz.id, 0).await.unwrap();
        assert!(view.is_empty());
        assert!(view.total.is_zero());
    }

    #[tokio::test]
    async fn test_set_quantity_is_capped() {
        let fx = fixture().await;
        let arroz = product(&fx, "7862104340108", "Arroz 1kg", "1.00", 80).await;
        set_quantity(&fx.db, &fx.cart, &fx.config, arroz.id, 2).await.unwrap();

        let err = set_quantity(&fx.db, &fx.cart, &fx.config, arroz.id, 5_000_000_000_000_000_000)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(fx.cart.with_cart(|c| c.quantity_of(arroz.id)), 2);

        let view = set_quantity(&fx.db, &fx.cart, &fx.config, arroz.id, MAX_LINE_QUANTITY)
            .await
            .unwrap();
        assert_eq!(view.item_count(), MAX_LINE_QUANTITY);
        assert_eq!(view.total, view.subtotal + view.tax);

        let err = add_by_id(&fx.db, &fx.cart, &fx.config, arroz.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(fx.cart.with_cart(|c| c.quantity_of(arroz.id)), MAX_LINE_QUANTITY);
    }

    #[tokio::test]
    async fn test_set_quantity_unknown_product() {
        let fx = fixture().await;
        let err = set_quantity(&fx.db, &fx.cart, &fx.config, 42, 2).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_view_shows_short_stock() {
        let fx = fixture().await;
        let galletas = product(&fx, "1234567890123", "Galletas", "0.50", 1).await;

        let view = set_quantity(&fx.db, &fx.cart, &fx.config, galletas.id, 2).await.unwrap();
        assert_eq!(view.lines[0].stock, 1);
        assert_eq!(view.lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_cancel_sale() {
        let fx = fixture().await;
        product(&fx, "7501031311309", "Coca Cola 500ml", "0.75", 100).await;
        add_by_barcode(&fx.db, &fx.cart, &fx.config, "7501031311309").await.unwrap();

        cancel_sale(&fx.cart).unwrap();

        let view = get_cart(&fx.db, &fx.cart, &fx.config).await.unwrap();
        assert!(view.is_empty());
    }
}
