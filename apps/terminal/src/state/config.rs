//! # Store Configuration
//!
//! Store details and the tax rate, loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TIENDA_*`)
//! 2. `.env` file in the working directory (loaded by `main` via dotenvy)
//! 3. Defaults (this file)
//!
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tienda_core::TaxRate;

/// Configuration loading failures. Startup stops on any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be used.
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    /// No platform data directory and no `TIENDA_DB_PATH`.
    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error("Could not create data directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Application configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Store name (receipt header)
    pub store_name: String,

    /// Tax id printed on receipts
    pub store_ruc: Option<String>,

    pub store_address: Option<String>,

    pub store_phone: Option<String>,

    /// Process-wide tax rate applied at checkout
    pub tax_rate: TaxRate,

    /// SQLite database file
    pub db_path: PathBuf,

    /// JSON file holding the open cart between runs
    pub cart_path: PathBuf,
}

/// Tax rate used when `TIENDA_TAX_RATE` is unset (15%).
pub const DEFAULT_TAX_BPS: u32 = 1500;

impl Default for StoreConfig {
    /// Development defaults: "Tienda", 15% tax, files in the working directory.
    fn default() -> Self {
        StoreConfig {
            store_name: "Tienda".to_string(),
            store_ruc: None,
            store_address: None,
            store_phone: None,
            tax_rate: TaxRate::from_bps(DEFAULT_TAX_BPS),
            db_path: PathBuf::from("tienda.db"),
            cart_path: PathBuf::from("tienda-cart.json"),
        }
    }
}

impl StoreConfig {
    /// Loads configuration from the process environment.
    ///
    /// ## Environment Variables
    /// - `TIENDA_STORE_NAME`, `TIENDA_STORE_RUC`, `TIENDA_STORE_ADDRESS`,
    ///   `TIENDA_STORE_PHONE`: receipt header
    /// - `TIENDA_TAX_RATE`: fraction, e.g. `0.15`
    /// - `TIENDA_DB_PATH`: database file (default: platform data dir)
    /// - `TIENDA_CART_PATH`: cart file (default: `cart.json` next to the db)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = StoreConfig::default();

        if let Some(name) = get("TIENDA_STORE_NAME") {
            config.store_name = name;
        }
        config.store_ruc = get("TIENDA_STORE_RUC");
        config.store_address = get("TIENDA_STORE_ADDRESS");
        config.store_phone = get("TIENDA_STORE_PHONE");

        if let Some(rate) = get("TIENDA_TAX_RATE") {
            config.tax_rate = TaxRate::parse(&rate)
                .map_err(|_| ConfigError::InvalidValue("TIENDA_TAX_RATE".to_string()))?;
        }

        config.db_path = match get("TIENDA_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => crate::default_database_path()?,
        };

        config.cart_path = match get("TIENDA_CART_PATH") {
            Some(path) => PathBuf::from(path),
            None => config
                .db_path
                .parent()
                .map(|dir| dir.join("cart.json"))
                .unwrap_or_else(|| PathBuf::from("cart.json")),
        };

        Ok(config)
    }

    /// Header lines printed at the top of a receipt.
    pub fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![self.store_name.clone()];
        if let Some(ruc) = &self.store_ruc {
            lines.push(format!("RUC: {}", ruc));
        }
        if let Some(address) = &self.store_address {
            lines.push(address.clone());
        }
        if let Some(phone) = &self.store_phone {
            lines.push(format!("Tel: {}", phone));
        }
        lines
    }
}
