//! # Checkout
//!
//! Turns a cart into a persisted sale in one database transaction.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       CheckoutService::run                              │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├─ 1. load cart products, price the cart ──► no lines? EmptyCart    │
//! │    ├─ 2. stock ≥ qty for every line?        ──► no? InsufficientStock  │
//! │    │                                            (nothing written yet)   │
//! │    ├─ 3. customer upsert                    ──► customer_fk             │
//! │    ├─ 4. INSERT sale (totals + customer snapshot)                       │
//! │    ├─ 5. per line: INSERT sale_item,                                    │
//! │    │              UPDATE stock = stock - qty WHERE stock >= qty         │
//! │    │              (0 rows ⇒ InsufficientStock)                          │
//! │    ├─ 6. invoice number = YYYYMMDD-{sale id:06}                         │
//! │    ├─ 7. INSERT invoice  (duplicate number ⇒ InvoiceNumberCollision)   │
//! │    │                                                                    │
//! │  COMMIT ──► cart.clear() ──► CompletedSale                              │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is kept and    │
//! │  the cart is left exactly as it was.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every statement runs on the transaction's connection. With a single
//! connection pool (tests) a query on the pool would wait forever.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::DbError;
use crate::repository::customer;
use crate::repository::product::{decrement_stock, fetch_many, fetch_stock};
use crate::repository::sale::{insert_invoice, insert_item, insert_sale, NewSale};
use tienda_core::validation::{normalize_payment_method, validate_customer_input};
use tienda_core::{
    invoice_number, Cart, CompletedSale, CoreError, CustomerInput, Product, TaxRate,
    ValidationError,
};

/// Why a checkout did not complete. In every case nothing was written.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Business rule: empty cart, insufficient stock, invalid input.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database failed; the transaction was rolled back.
    #[error("Persistence error: {0}")]
    Persistence(#[from] DbError),

    /// The generated invoice number already exists. Never renumbered.
    #[error("Invoice number {0} already exists")]
    InvoiceNumberCollision(String),
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Core(err.into())
    }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Persistence(err.into())
    }
}

/// Runs checkouts against the pool.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
}

impl CheckoutService {
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService { pool }
    }

    /// Checks out `cart`.
    ///
    /// ## Arguments
    /// * `cart` - Cleared on success, untouched on failure
    /// * `customer` - Fields as typed; blank means absent
    /// * `payment_method` - Blank means `EFECTIVO`
    /// * `tax_rate` - Process-wide rate from configuration
    ///
    /// ## Example
    /// ```rust,ignore
    /// let done = db.checkout()
    ///     .run(&mut cart, CustomerInput::default(), "EFECTIVO", rate)
    ///     .await?;
    /// println!("{}", done.invoice.invoice_number); // 20240307-000042
    /// ```
    pub async fn run(
        &self,
        cart: &mut Cart,
        customer: CustomerInput,
        payment_method: &str,
        tax_rate: TaxRate,
    ) -> Result<CompletedSale, CheckoutError> {
        let customer = validate_customer_input(customer)?;
        let payment_method = normalize_payment_method(payment_method)?;

        debug!(lines = cart.len(), payment_method = %payment_method, "Starting checkout");

        let mut tx = self.pool.begin().await?;

        // 1. Price the cart against the products as they are right now
        let catalog: HashMap<i64, Product> = fetch_many(&mut *tx, &cart.product_ids())
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let priced = cart.compute_totals(&catalog, tax_rate)?;

        if priced.is_empty() {
            warn!("Checkout rejected: cart is empty");
            return Err(CoreError::EmptyCart.into());
        }

        // 2. Stock check before any write
        if let Some(line) = priced.first_short_line() {
            warn!(
                product_id = %line.product.id,
                available = line.product.stock,
                requested = line.quantity,
                "Checkout rejected: insufficient stock"
            );
            return Err(CoreError::InsufficientStock {
                barcode: line.product.barcode.clone(),
                name: line.product.name.clone(),
                available: line.product.stock,
                requested: line.quantity,
            }
            .into());
        }

        // 3. Customer directory
        let customer_fk = customer::upsert(&mut *tx, customer.clone()).await?;

        // 4. Sale header
        let created_at = Utc::now();
        let sale = insert_sale(
            &mut *tx,
            &NewSale {
                created_at,
                customer_fk,
                customer,
                payment_method,
                subtotal: priced.subtotal,
                tax: priced.tax,
                total: priced.total,
            },
        )
        .await?;

        // 5. Items and stock
        let mut items = Vec::with_capacity(priced.lines.len());
        for line in &priced.lines {
            items.push(insert_item(&mut *tx, sale.id, line).await?);

            if !decrement_stock(&mut *tx, line.product.id, line.quantity).await? {
                let available = fetch_stock(&mut *tx, line.product.id).await?;
                warn!(
                    product_id = %line.product.id,
                    available,
                    requested = line.quantity,
                    "Checkout rolled back: stock changed during checkout"
                );
                return Err(CoreError::InsufficientStock {
                    barcode: line.product.barcode.clone(),
                    name: line.product.name.clone(),
                    available,
                    requested: line.quantity,
                }
                .into());
            }
        }

        // 6-7. Invoice
        let number = invoice_number(created_at.date_naive(), sale.id);
        let invoice = match insert_invoice(&mut *tx, sale.id, &number, created_at).await {
            Ok(invoice) => invoice,
            Err(e) if e.is_unique_violation_on("invoices.invoice_number") => {
                warn!(invoice_number = %number, "Checkout rolled back: invoice number collision");
                return Err(CheckoutError::InvoiceNumberCollision(number));
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        cart.clear();

        info!(
            sale_id = %sale.id,
            invoice_number = %invoice.invoice_number,
            total = %sale.total(),
            items = items.len(),
            "Checkout completed"
        );

        Ok(CompletedSale {
            sale,
            items,
            invoice,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
