//! The error every terminal command returns.
//!
//! ```text
//! ValidationError ─┐
//! CoreError ───────┼──► ApiError { code, message } ──► "[CODE] message"
//! DbError ─────────┤
//! CheckoutError ───┘
//! ```
//!
//! Business outcomes keep their own message. Storage failures are logged in
//! full and replaced with a generic line, so the cashier never sees SQL.

use serde::Serialize;
use tienda_core::{CoreError, ValidationError};
use tienda_db::{CheckoutError, DbError, StoreError};

use crate::state::CartFileError;

/// Error returned from terminal commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 7501031311309"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes shown next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, customer, sale or invoice does not exist
    NotFound,

    /// Input validation failed (including duplicate barcode/doc id)
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Checkout with nothing sellable in the cart
    EmptyCart,

    /// Insufficient stock
    InsufficientStock,

    /// Generated invoice number already exists
    IntegrityError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    /// The serialized name, e.g. `NOT_FOUND`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::EmptyCart => "EMPTY_CART",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::IntegrityError => "INTEGRITY_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let message = match &err {
            DbError::NotFound { entity, id } => return ApiError::not_found(entity, id),
            DbError::UniqueViolation { field, value } => {
                return ApiError::validation(format!("{} '{}' already exists", field, value))
            }
            DbError::CheckViolation { message } => {
                tracing::warn!(%message, "Check constraint rejected a write");
                return ApiError::validation("Value out of range");
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!(%message, "Foreign key rejected a write");
                return ApiError::validation("Invalid reference");
            }
            DbError::PoolExhausted => "Database is busy, try again",
            DbError::ConnectionFailed(_) => "Database connection failed",
            DbError::MigrationFailed(_) => "Database migration failed",
            DbError::TransactionFailed(_) => "Database transaction failed",
            DbError::QueryFailed(_) | DbError::Internal(_) => "Database operation failed",
        };

        tracing::error!(error = %err, "Storage failure");
        ApiError::new(ErrorCode::DatabaseError, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, "Cart is empty"),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::AmountOutOfRange => ApiError::validation(err.to_string()),
            CoreError::DuplicateBarcode(_) | CoreError::DuplicateDocId(_) => {
                ApiError::validation(err.to_string())
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Core(e) => e.into(),
            StoreError::Db(e) => e.into(),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Core(e) => e.into(),
            CheckoutError::Persistence(e) => e.into(),
            CheckoutError::InvoiceNumberCollision(number) => {
                tracing::error!(invoice_number = %number, "Invoice number collision");
                ApiError::new(
                    ErrorCode::IntegrityError,
                    format!("Invoice number {} already exists; sale not recorded", number),
                )
            }
        }
    }
}

impl From<CartFileError> for ApiError {
    fn from(err: CartFileError) -> Self {
        tracing::error!("Cart session file error: {}", err);
        ApiError::internal("Could not save the cart")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}
