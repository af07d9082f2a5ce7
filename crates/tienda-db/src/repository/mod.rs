//! One repository per table group, each holding a pool handle:
//!
//! - [`product::ProductRepository`]: catalog reads, edits and stock
//! - [`customer::CustomerRepository`]: customer directory and upsert
//! - [`sale::SaleRepository`]: sales history, invoices, daily summary
//!
//! Statements the checkout needs are also exposed as free functions over
//! `&mut SqliteConnection`, so the whole sale runs on the transaction's
//! connection.

pub mod customer;
pub mod product;
pub mod sale;
