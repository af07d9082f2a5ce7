//! # Sale Repository
//!
//! Database operations for sales, sale items and invoices.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CHECKOUT (one transaction, see checkout.rs)                        │
//! │     └── insert_sale()    → Sale (frozen totals + customer snapshot)    │
//! │     └── insert_item()    → SaleItem × N (frozen name/barcode/price)    │
//! │     └── insert_invoice() → Invoice (YYYYMMDD-NNNNNN)                   │
//! │                                                                         │
//! │  2. READ                                                               │
//! │     └── get_detail() / find_by_invoice_number() → CompletedSale        │
//! │     └── daily_summary() → count + total for a UTC day                  │
//! │                                                                         │
//! │  3. (OPTIONAL) DELETE                                                  │
//! │     └── delete() → invoice, items, sale (stock is NOT restored)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use tienda_core::{CompletedSale, CustomerInput, Invoice, Money, PricedLine, Sale, SaleItem};

const SALE_COLUMNS: &str = "id, created_at, customer_fk, customer_name, customer_doc_id, \
     customer_phone, customer_address, customer_email, payment_method, \
     subtotal_cents, tax_cents, total_cents";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, product_name, barcode, quantity, \
     unit_price_cents, line_total_cents";

const INVOICE_COLUMNS: &str = "id, sale_id, invoice_number, created_at";

/// Sales count and takings for one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub sale_count: i64,
    pub total: Money,
}

/// A sale about to be written: totals and the customer fields as typed.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub created_at: DateTime<Utc>,
    pub customer_fk: Option<i64>,
    pub customer: CustomerInput,
    pub payment_method: String,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in the order they were rung up.
    pub async fn get_items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets the invoice of a sale.
    pub async fn get_invoice(&self, sale_id: i64) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE sale_id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Loads a sale with its items and invoice (the invoice view).
    ///
    /// A sale without an invoice is reported as not found.
    pub async fn get_detail(&self, sale_id: i64) -> DbResult<CompletedSale> {
        let sale = self
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        let invoice = self
            .get_invoice(sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice for sale", sale_id))?;

        let items = self.get_items(sale_id).await?;

        Ok(CompletedSale {
            sale,
            items,
            invoice,
        })
    }

    /// Finds a sale by its invoice number.
    pub async fn find_by_invoice_number(&self, number: &str) -> DbResult<Option<CompletedSale>> {
        let sale_id: Option<i64> =
            sqlx::query_scalar("SELECT sale_id FROM invoices WHERE invoice_number = ?1")
                .bind(number.trim())
                .fetch_optional(&self.pool)
                .await?;

        match sale_id {
            Some(id) => Ok(Some(self.get_detail(id).await?)),
            None => Ok(None),
        }
    }

    /// Most recent sales first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY id DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Number of sales and their summed totals for a UTC calendar day.
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        let end = start + Duration::days(1);

        let (sale_count, total_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailySummary {
            date,
            sale_count,
            total: Money::from_cents(total_cents),
        })
    }

    /// Deletes a sale with its invoice and items in one transaction.
    ///
    /// Stock taken by the sale is not given back.
    pub async fn delete(&self, sale_id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM invoices WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // tx dropped here, nothing committed
            return Err(DbError::not_found("Sale", sale_id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(sale_id = %sale_id, "Sale deleted");
        Ok(())
    }
}

// =============================================================================
// Connection-level operations (used inside the checkout transaction)
// =============================================================================

/// Inserts the sale header and returns it with its new id.
pub async fn insert_sale(conn: &mut SqliteConnection, sale: &NewSale) -> DbResult<Sale> {
    let c = &sale.customer;

    let result = sqlx::query(
        r#"
        INSERT INTO sales (
            created_at, customer_fk,
            customer_name, customer_doc_id, customer_phone, customer_address, customer_email,
            payment_method, subtotal_cents, tax_cents, total_cents
        ) VALUES (
            ?1, ?2,
            ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11
        )
        "#,
    )
    .bind(sale.created_at)
    .bind(sale.customer_fk)
    .bind(&c.name)
    .bind(&c.doc_id)
    .bind(&c.phone)
    .bind(&c.address)
    .bind(&c.email)
    .bind(&sale.payment_method)
    .bind(sale.subtotal.cents())
    .bind(sale.tax.cents())
    .bind(sale.total.cents())
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    debug!(sale_id = %id, "Inserted sale");

    Ok(Sale {
        id,
        created_at: sale.created_at,
        customer_fk: sale.customer_fk,
        customer_name: c.name.clone(),
        customer_doc_id: c.doc_id.clone(),
        customer_phone: c.phone.clone(),
        customer_address: c.address.clone(),
        customer_email: c.email.clone(),
        payment_method: sale.payment_method.clone(),
        subtotal_cents: sale.subtotal.cents(),
        tax_cents: sale.tax.cents(),
        total_cents: sale.total.cents(),
    })
}

/// Inserts one priced cart line as a sale item, freezing name, barcode and
/// unit price.
pub async fn insert_item(
    conn: &mut SqliteConnection,
    sale_id: i64,
    line: &PricedLine,
) -> DbResult<SaleItem> {
    let result = sqlx::query(
        r#"
        INSERT INTO sale_items (
            sale_id, product_id, product_name, barcode,
            quantity, unit_price_cents, line_total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(sale_id)
    .bind(line.product.id)
    .bind(&line.product.name)
    .bind(&line.product.barcode)
    .bind(line.quantity)
    .bind(line.unit_price.cents())
    .bind(line.line_total.cents())
    .execute(&mut *conn)
    .await?;

    Ok(SaleItem {
        id: result.last_insert_rowid(),
        sale_id,
        product_id: line.product.id,
        product_name: line.product.name.clone(),
        barcode: line.product.barcode.clone(),
        quantity: line.quantity,
        unit_price_cents: line.unit_price.cents(),
        line_total_cents: line.line_total.cents(),
    })
}

/// Inserts the invoice of a sale.
pub async fn insert_invoice(
    conn: &mut SqliteConnection,
    sale_id: i64,
    invoice_number: &str,
    created_at: DateTime<Utc>,
) -> DbResult<Invoice> {
    let result = sqlx::query(
        "INSERT INTO invoices (sale_id, invoice_number, created_at) VALUES (?1, ?2, ?3)",
    )
    .bind(sale_id)
    .bind(invoice_number)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    Ok(Invoice {
        id: result.last_insert_rowid(),
        sale_id,
        invoice_number: invoice_number.to_string(),
        created_at,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
