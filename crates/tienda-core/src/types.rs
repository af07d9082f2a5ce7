//! # Domain Types
//!
//! Core domain types used throughout Tienda POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Invoice      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  barcode        │◄──│  customer_*     │──►│  sale_id (1:1)  │       │
//! │  │  name           │   │  (snapshot)     │   │  invoice_number │       │
//! │  │  price_cents    │   │  totals         │   └─────────────────┘       │
//! │  │  stock          │   └────────┬────────┘                              │
//! │  └─────────────────┘            │ 1:N                                   │
//! │                        ┌────────▼────────┐   ┌─────────────────┐       │
//! │                        │    SaleItem     │   │    Customer     │       │
//! │                        │  product_name,  │   │  doc_id (unique)│       │
//! │                        │  barcode frozen │   │  name, phone... │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A Sale copies the customer fields and a SaleItem copies the product name,
//! barcode and price at checkout time. Later edits to a Customer or Product
//! never change what a historical invoice shows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

/// Payment method recorded when the cashier leaves the field blank.
pub const DEFAULT_PAYMENT_METHOD: &str = "EFECTIVO";

// =============================================================================
// Tax Rate
// =============================================================================

/// Process-wide tax rate as a decimal fraction (`0.15` = 15%).
///
/// ## Why Decimal?
/// Rates like 12% or 15% are exact in decimal, so `subtotal × rate` is an
/// exact product and the only rounding is the final half-up step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Creates a tax rate from a fraction, which must be within `0..=1`.
    pub fn from_fraction(fraction: Decimal) -> Result<Self, ValidationError> {
        if fraction.is_sign_negative() || fraction > Decimal::ONE {
            return Err(ValidationError::InvalidFormat {
                field: "tax_rate".to_string(),
                reason: format!("must be a fraction between 0 and 1, got {}", fraction),
            });
        }
        Ok(TaxRate(fraction))
    }

    /// Parses a textual fraction such as `"0.15"`.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::types::TaxRate;
    ///
    /// let rate = TaxRate::parse("0.15").unwrap();
    /// assert_eq!(rate.to_string(), "15%");
    /// assert!(TaxRate::parse("15").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let fraction =
            Decimal::from_str(text.trim()).map_err(|e| ValidationError::InvalidFormat {
                field: "tax_rate".to_string(),
                reason: e.to_string(),
            })?;
        TaxRate::from_fraction(fraction)
    }

    /// Creates a tax rate from basis points (1500 = 15%).
    pub fn from_bps(bps: u32) -> Self {
        TaxRate(Decimal::new(i64::from(bps), 4))
    }

    /// Returns the rate as a fraction.
    #[inline]
    pub fn fraction(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a percentage (for display).
    pub fn percentage(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl std::fmt::Display for TaxRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Database identity.
    pub id: i64,

    /// Barcode (EAN-13, UPC-A, or any shop code). Unique.
    pub barcode: String,

    /// Display name shown to cashier and on the invoice.
    pub name: String,

    /// Price in cents.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be taken from stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Catalog input for creating or editing a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub barcode: String,
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer identified by an external document id (cédula/RUC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub doc_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer fields as typed by the cashier at checkout. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInput {
    pub doc_id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
}

impl CustomerInput {
    /// Trims every field and turns blank strings into `None`.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::types::CustomerInput;
    ///
    /// let input = CustomerInput {
    ///     doc_id: Some("  0102030405 ".into()),
    ///     name: Some("   ".into()),
    ///     ..Default::default()
    /// }
    /// .normalized();
    ///
    /// assert_eq!(input.doc_id.as_deref(), Some("0102030405"));
    /// assert_eq!(input.name, None);
    /// ```
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        CustomerInput {
            doc_id: clean(self.doc_id),
            name: clean(self.name),
            phone: clean(self.phone),
            address: clean(self.address),
            email: clean(self.email),
        }
    }

    /// True when no field was supplied (anonymous sale).
    pub fn is_anonymous(&self) -> bool {
        self.doc_id.is_none()
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale with frozen totals and customer snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    /// Directory record resolved by the upsert, if any.
    pub customer_fk: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_doc_id: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub customer_email: Option<String>,
    pub payment_method: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Barcode at time of sale (frozen).
    pub barcode: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// The printable, uniquely numbered document of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: i64,
    pub sale_id: i64,
    pub invoice_number: String,
    pub created_at: DateTime<Utc>,
}

/// A sale together with its items and invoice, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub invoice: Invoice,
}

// =============================================================================
// Unit Tests
// =============================================================================
