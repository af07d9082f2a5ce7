//! # Validation Module
//!
//! Input validation for catalog edits, customer records and checkout fields.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal command parsing                                     │
//! │  └── Numbers parse, required words present                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Lengths, non-negative money and stock, trimming                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE constraints (barcode, doc_id, invoice_number)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Column limits mirror the schema: barcode 64, names 120, doc id 20,
//! phone 30, address 200, email 120. A cart line holds at most
//! [`MAX_LINE_QUANTITY`] units.

use crate::error::ValidationError;
use crate::types::{CustomerInput, NewProduct, DEFAULT_PAYMENT_METHOD};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_BARCODE_LEN: usize = 64;
const MAX_NAME_LEN: usize = 120;
const MAX_DOC_ID_LEN: usize = 20;
const MAX_PHONE_LEN: usize = 30;
const MAX_ADDRESS_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 120;
const MAX_QUERY_LEN: usize = 100;

/// Most units a single cart line may hold.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

fn required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    max_len(field, value, max)?;
    Ok(value.to_string())
}

fn max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Catalog
// =============================================================================

/// Validates a barcode: required, at most 64 characters, no inner whitespace.
///
/// ## Example
/// ```rust
/// use tienda_core::validation::validate_barcode;
///
/// assert_eq!(validate_barcode(" 7501031311309 ").unwrap(), "7501031311309");
/// assert!(validate_barcode("").is_err());
/// assert!(validate_barcode("750 103").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<String> {
    let barcode = required("barcode", barcode, MAX_BARCODE_LEN)?;

    if barcode.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(barcode)
}

/// Validates a product name: required, at most 120 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    required("name", name, MAX_NAME_LEN)
}

/// Validates a stock level: zero or more units.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a requested line quantity. Zero or less is allowed and means
/// "remove the line"; the upper bound is [`MAX_LINE_QUANTITY`].
///
/// ## Example
/// ```rust
/// use tienda_core::validation::{validate_quantity, MAX_LINE_QUANTITY};
///
/// assert!(validate_quantity(0).is_ok());
/// assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
/// assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
/// ```
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a whole catalog entry and returns it trimmed.
pub fn validate_new_product(product: NewProduct) -> ValidationResult<NewProduct> {
    let barcode = validate_barcode(&product.barcode)?;
    let name = validate_product_name(&product.name)?;
    validate_price_cents(product.price.cents())?;
    validate_stock(product.stock)?;

    Ok(NewProduct {
        barcode,
        name,
        ..product
    })
}

/// Validates a search query and returns it trimmed. Empty is allowed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    max_len("query", query, MAX_QUERY_LEN)?;
    Ok(query.to_string())
}

// =============================================================================
// Customers & Checkout
// =============================================================================

/// Normalizes checkout customer fields and checks their lengths.
///
/// Blank fields become `None`; nothing here is required because an
/// anonymous sale carries no customer at all.
pub fn validate_customer_input(input: CustomerInput) -> ValidationResult<CustomerInput> {
    let input = input.normalized();

    let limits = [
        ("doc_id", &input.doc_id, MAX_DOC_ID_LEN),
        ("customer name", &input.name, MAX_NAME_LEN),
        ("phone", &input.phone, MAX_PHONE_LEN),
        ("address", &input.address, MAX_ADDRESS_LEN),
        ("email", &input.email, MAX_EMAIL_LEN),
    ];
    for (field, value, max) in limits {
        if let Some(value) = value {
            max_len(field, value, max)?;
        }
    }

    Ok(input)
}

/// Normalizes the payment method. Blank means cash (`EFECTIVO`); anything
/// else is accepted as typed.
///
/// ## Example
/// ```rust
/// use tienda_core::validation::normalize_payment_method;
///
/// assert_eq!(normalize_payment_method("  ").unwrap(), "EFECTIVO");
/// assert_eq!(normalize_payment_method(" TARJETA ").unwrap(), "TARJETA");
/// assert!(normalize_payment_method(&"TRANSFERENCIA ".repeat(10)).is_ok());
/// ```
pub fn normalize_payment_method(method: &str) -> ValidationResult<String> {
    let method = method.trim();
    if method.is_empty() {
        return Ok(DEFAULT_PAYMENT_METHOD.to_string());
    }
    Ok(method.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
