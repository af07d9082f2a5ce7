//! SQLite storage for the store: catalog, customers, sales and invoices.
//!
//! ```text
//!   terminal command
//!         │
//!         ▼
//!     Database ──────────► ProductRepository   (catalog, stock)
//!    (SqlitePool)  ├─────► CustomerRepository  (lookup by doc id)
//!         │        ├─────► SaleRepository      (history, invoices, totals)
//!         │        └─────► CheckoutService     (one transaction per sale)
//!         ▼
//!   migrations/sqlite/*.sql, applied on open
//! ```
//!
//! Money is stored as integer cents and timestamps as RFC 3339 text.
//!
//! ```rust,ignore
//! use tienda_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tienda.db")).await?;
//! let coke = db.products().get_by_barcode("7501031311309").await?;
//! let done = db.checkout().run(&mut cart, customer, "EFECTIVO", rate).await?;
//! ```

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use checkout::{CheckoutError, CheckoutService};
pub use error::{DbError, DbResult, StoreError, StoreResult};
pub use pool::{Database, DbConfig, DbLocation};

pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{DailySummary, SaleRepository};
