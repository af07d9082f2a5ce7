//! Errors raised by cart, pricing and validation logic.
//!
//! [`ValidationError`] covers malformed input and is caught before anything
//! is stored. [`CoreError`] adds the business outcomes a cashier can hit at
//! checkout (empty cart, short stock, duplicates). The storage crate wraps
//! both, and the terminal turns them into an error code plus a message.

use thiserror::Error;

/// Expected, recoverable outcomes. The caller shows the message and leaves
/// the cart as it was.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout attempted with no valid cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A cart line asks for more units than the shelf holds. Reported for
    /// the first such line; nothing is written.
    #[error("Insufficient stock for {name} ({barcode}): available {available}, requested {requested}")]
    InsufficientStock {
        barcode: String,
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A line total, subtotal, tax or total does not fit in i64 cents.
    #[error("Cart total is larger than the register can record")]
    AmountOutOfRange,

    /// Another product already uses this barcode.
    #[error("Barcode '{0}' already exists")]
    DuplicateBarcode(String),

    /// Another customer already uses this document id.
    #[error("Customer document '{0}' already exists")]
    DuplicateDocId(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Input rejected before any business rule runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Missing, or only whitespace.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Unparsable amount, malformed invoice number and the like.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            barcode: "1234567890123".to_string(),
            name: "Galletas".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Galletas (1234567890123): available 3, requested 5"
        );
        assert_eq!(CoreError::EmptyCart.to_string(), "Cart is empty");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        assert_eq!(err.to_string(), "barcode is required");

        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max: 120,
        };
        assert_eq!(err.to_string(), "name must be at most 120 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
