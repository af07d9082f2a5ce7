//! The cashier terminal, minus its stdin loop (see `main.rs`).
//!
//! - [`state`]: store config, the database handle and the open cart
//! - [`commands`]: one async function per cashier action, all returning
//!   `Result<_, ApiError>`
//! - [`receipt`]: the plain-text invoice printed after checkout
//! - [`error`]: [`error::ApiError`] and its codes

pub mod commands;
pub mod error;
pub mod receipt;
pub mod state;

use directories::ProjectDirs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use state::ConfigError;

/// Structured logs on stderr, away from receipts on stdout.
///
/// `RUST_LOG` overrides the default `info,tienda=debug,sqlx=warn`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tienda=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Platform database location, used when `TIENDA_DB_PATH` is unset.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.tienda.pos/tienda.db`
/// - **Windows**: `%APPDATA%\tienda\pos\data\tienda.db`
/// - **Linux**: `~/.local/share/pos/tienda.db`
pub fn default_database_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs = ProjectDirs::from("com", "tienda", "pos").ok_or(ConfigError::NoDataDir)?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("tienda.db"))
}
