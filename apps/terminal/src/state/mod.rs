//! Terminal state. Commands take only the pieces they touch:
//!
//! - [`DbState`]: the store database; its pool is already shareable
//! - [`CartState`]: the open cart behind a mutex, mirrored to a session file
//! - [`StoreConfig`]: receipt header, tax rate and paths, fixed at startup

mod cart;
mod config;
mod db;

pub use cart::{CartFileError, CartState};
pub use config::{ConfigError, StoreConfig, DEFAULT_TAX_BPS};
pub use db::DbState;
