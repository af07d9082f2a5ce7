//! # Sale Commands
//!
//! Checkout, invoice lookup and the daily dashboard numbers.
//!
//! ## Checkout Flow
//! ```text
//! CartState ──snapshot──► CheckoutService::run(&mut cart, ...)
//!                                │
//!              ┌─────────────────┴─────────────────┐
//!              ▼                                   ▼
//!          Ok(sale)                           Err(reason)
//!   cart cleared, written back           CartState untouched,
//!   to CartState + session file          nothing persisted
//! ```
//!
//! Once the transaction commits the sale stands. A session file that cannot
//! be rewritten after that is logged, not reported as a failed checkout.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use tienda_core::invoice::parse_invoice_number;
use tienda_core::{CompletedSale, CustomerInput, Sale};
use tienda_db::DailySummary;

use crate::error::ApiError;
use crate::state::{CartState, DbState, StoreConfig};

/// Sales shown by `recent_sales` when no limit is given.
pub const RECENT_SALES_LIMIT: i64 = 10;

/// Completes the sale in the cart.
///
/// ## Arguments
/// * `customer` - Fields as typed at the prompt; blank means absent
/// * `payment_method` - Blank means `EFECTIVO`
///
/// ## Returns
/// The stored sale with items and invoice. On any error the cart is kept
/// and nothing was written.
pub async fn checkout(
    db: &DbState,
    cart: &CartState,
    config: &StoreConfig,
    customer: CustomerInput,
    payment_method: &str,
) -> Result<CompletedSale, ApiError> {
    let mut snapshot = cart.snapshot();
    debug!(lines = snapshot.len(), "checkout command");

    let completed = db
        .inner()
        .checkout()
        .run(&mut snapshot, customer, payment_method, config.tax_rate)
        .await?;

    if let Err(e) = cart.replace(snapshot) {
        warn!(
            sale_id = completed.sale.id,
            error = %e,
            "Sale recorded but the cart session file was not cleared"
        );
    }

    info!(
        sale_id = completed.sale.id,
        invoice_number = %completed.invoice.invoice_number,
        "Sale completed"
    );
    Ok(completed)
}

/// Invoice view by invoice number (`YYYYMMDD-NNNNNN`).
pub async fn get_invoice(db: &DbState, number: &str) -> Result<CompletedSale, ApiError> {
    parse_invoice_number(number.trim())?;

    db.inner()
        .sales()
        .find_by_invoice_number(number)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", number.trim()))
}

/// Invoice view by sale id.
pub async fn get_sale(db: &DbState, sale_id: i64) -> Result<CompletedSale, ApiError> {
    Ok(db.inner().sales().get_detail(sale_id).await?)
}

/// Latest sales first.
pub async fn recent_sales(db: &DbState, limit: Option<i64>) -> Result<Vec<Sale>, ApiError> {
    let limit = limit.unwrap_or(RECENT_SALES_LIMIT).clamp(1, 100);
    Ok(db.inner().sales().list_recent(limit).await?)
}

/// Sale count and takings for a UTC day.
pub async fn daily_summary(db: &DbState, date: NaiveDate) -> Result<DailySummary, ApiError> {
    Ok(db.inner().sales().daily_summary(date).await?)
}

/// Sale count and takings for today (UTC).
pub async fn today_summary(db: &DbState) -> Result<DailySummary, ApiError> {
    daily_summary(db, Utc::now().date_naive()).await
}
