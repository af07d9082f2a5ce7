//! # Cart State
//!
//! Holds the open cart and keeps its serialized form in a session file, so a
//! restarted terminal picks up where the cashier left off.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Cashier Action           Command                 Cart State Change     │
//! │  ──────────────           ───────                 ─────────────────     │
//! │                                                                         │
//! │  Scan barcode ───────────► add_by_barcode() ────► line.quantity += 1   │
//! │                                                                         │
//! │  Change quantity ────────► set_quantity() ──────► line.quantity = n    │
//! │                                                                         │
//! │  Cancel sale ────────────► cancel_sale() ───────► lines.clear()        │
//! │                                                                         │
//! │  Checkout ───────────────► snapshot() ... replace(cleared)             │
//! │                                                                         │
//! │  Every write is followed by a save to the session file.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tienda_core::Cart;
use tracing::{debug, warn};

/// Session file read/write failures.
#[derive(Debug, Error)]
pub enum CartFileError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode cart: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The open cart, shared by all commands.
///
/// Uses `Arc<Mutex<Cart>>`: commands are short and almost all of them write.
#[derive(Debug)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
    file: Option<PathBuf>,
}

impl CartState {
    /// Creates an empty cart that is never written to disk.
    pub fn new() -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new())),
            file: None,
        }
    }

    /// Opens the session file at `path`.
    ///
    /// A missing file is an empty cart. A file that does not parse is logged
    /// and replaced with an empty cart on the next save.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CartFileError> {
        let path = path.into();

        let cart = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Cart>(&bytes) {
                Ok(cart) => cart,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable cart file");
                    Cart::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Cart::new(),
            Err(source) => return Err(CartFileError::Io { path, source }),
        };

        debug!(path = %path.display(), lines = cart.len(), "Cart session loaded");

        Ok(CartState {
            cart: Arc::new(Mutex::new(cart)),
            file: Some(path),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        // A panic while holding the lock leaves a valid Cart behind
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.lock();
        f(&cart)
    }

    /// Executes a function with write access to the cart, then saves it.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add(product.id))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> Result<R, CartFileError>
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.lock();
        let result = f(&mut cart);
        self.save(&cart)?;
        Ok(result)
    }

    /// A copy of the cart as it is now.
    pub fn snapshot(&self) -> Cart {
        self.lock().clone()
    }

    /// Overwrites the cart (last write wins) and saves it.
    pub fn replace(&self, cart: Cart) -> Result<(), CartFileError> {
        let mut current = self.lock();
        *current = cart;
        self.save(&current)
    }

    /// Session file path, if any.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    fn save(&self, cart: &Cart) -> Result<(), CartFileError> {
        let Some(path) = &self.file else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(cart)?;

        // Write then rename so a crash never leaves half a file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| CartFileError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| CartFileError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(())
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT: AtomicUsize = AtomicUsize::new(0);

    fn temp_cart_path() -> PathBuf {
        let n = NEXT.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("tienda-cart-{}-{}.json", std::process::id(), n))
    }

    #[test]
    fn test_in_memory_cart() {
        let state = CartState::new();
        state.with_cart_mut(|c| c.add(7)).unwrap();
        state.with_cart_mut(|c| c.add(7)).unwrap();

        assert_eq!(state.with_cart(|c| c.quantity_of(7)), 2);
        assert!(state.file().is_none());
    }

    #[test]
    fn test_survives_reload() {
        let path = temp_cart_path();

        let state = CartState::load(&path).unwrap();
        state.with_cart_mut(|c| c.set_quantity(3, 4)).unwrap();
        drop(state);

        let reloaded = CartState::load(&path).unwrap();
        assert_eq!(reloaded.with_cart(|c| c.quantity_of(3)), 4);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let state = CartState::load(temp_cart_path()).unwrap();
        assert!(state.with_cart(|c| c.is_empty()));
    }

    #[test]
    fn test_unreadable_file_is_empty() {
        let path = temp_cart_path();
        fs::write(&path, b"{not json").unwrap();

        let state = CartState::load(&path).unwrap();
        assert!(state.with_cart(|c| c.is_empty()));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_replace_is_last_write_wins() {
        let state = CartState::new();
        state.with_cart_mut(|c| c.add(1)).unwrap();

        let mut snapshot = state.snapshot();
        state.with_cart_mut(|c| c.add(2)).unwrap();

        snapshot.clear();
        state.replace(snapshot).unwrap();
        assert!(state.with_cart(|c| c.is_empty()));
    }
}
