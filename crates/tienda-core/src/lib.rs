//! # tienda-core: Pure Business Logic for Tienda POS
//!
//! Everything the checkout needs to know that does not touch a disk: money
//! and rounding, the cart and its pricing, invoice numbering, validation.
//!
//! ```text
//!  terminal ──► tienda-db ──► tienda-core
//!      └──────────────────────────┘
//! ```
//!
//! Both upper layers price carts and validate input through this crate, so
//! the receipt and the stored sale can never disagree on a total.
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, Invoice, TaxRate)
//! - [`money`] - Money type and the round-half-up rule
//! - [`cart`] - Cart and cart pricing
//! - [`invoice`] - Invoice number format
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tienda_core::money::Money;
//! use tienda_core::types::TaxRate;
//!
//! let price = Money::parse("1.65").unwrap();
//! let tax = price.calculate_tax(TaxRate::parse("0.15").unwrap()).unwrap();
//!
//! // $1.65 × 15% = $0.2475 → $0.25
//! assert_eq!(tax.cents(), 25);
//! ```

pub mod cart;
pub mod error;
pub mod invoice;
pub mod money;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartLine, PricedCart, PricedLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::invoice_number;
pub use money::Money;
pub use types::*;

/// Minimum length of a document id before a lookup is attempted.
pub const MIN_DOC_ID_LOOKUP_LEN: usize = 5;

/// Minimum length of a quick-search query.
pub const MIN_SEARCH_LEN: usize = 2;

/// Maximum results returned by quick search and low-stock reports.
pub const SEARCH_LIMIT: i64 = 10;

/// Products at or below this stock level are reported as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;
