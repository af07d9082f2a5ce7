//! # Commands Module
//!
//! Everything the cashier can do, as plain async functions. The command loop
//! in `main.rs` parses a line, calls one of these and prints the result.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── product.rs   ◄─── Search, catalog edits, low stock
//! ├── cart.rs      ◄─── Scan, quantities, cancel
//! ├── customer.rs  ◄─── Customer lookup and edits
//! └── sale.rs      ◄─── Checkout, invoices, daily summary
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs database
//! async fn search_products(db: &DbState, query: &str)
//!
//! // Needs database, cart and tax rate
//! async fn add_by_barcode(db: &DbState, cart: &CartState, config: &StoreConfig, barcode: &str)
//! ```

pub mod cart;
pub mod customer;
pub mod product;
pub mod sale;
