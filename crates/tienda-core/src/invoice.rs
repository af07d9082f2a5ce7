//! # Invoice Numbering
//!
//! Invoice numbers have the shape `YYYYMMDD-NNNNNN`: the UTC date the sale
//! was created, a dash, and the sale id zero-padded to at least 6 digits.
//!
//! ```text
//! sale 42 created 2024-03-07T15:04:00Z  ──►  20240307-000042
//! sale 1234567                          ──►  20240307-1234567  (no truncation)
//! ```
//!
//! The id part is what makes numbers unique; the date is informative. The
//! database still enforces uniqueness, and a collision aborts the checkout.

use chrono::NaiveDate;

use crate::error::ValidationError;

/// Formats the invoice number for a sale.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tienda_core::invoice::invoice_number;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
/// assert_eq!(invoice_number(date, 42), "20240307-000042");
/// ```
pub fn invoice_number(date: NaiveDate, sale_id: i64) -> String {
    format!("{}-{:06}", date.format("%Y%m%d"), sale_id)
}

/// Splits an invoice number back into its date and sale id.
pub fn parse_invoice_number(number: &str) -> Result<(NaiveDate, i64), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "invoice_number".to_string(),
        reason: reason.to_string(),
    };

    let (date, id) = number
        .trim()
        .split_once('-')
        .ok_or_else(|| invalid("expected YYYYMMDD-NNNNNN"))?;

    if date.len() != 8 || id.len() < 6 || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected YYYYMMDD-NNNNNN"));
    }

    let date = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid("invalid date"))?;
    let id = id.parse::<i64>().map_err(|_| invalid("invalid sale id"))?;

    Ok((date, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn test_zero_padding() {
        assert_eq!(invoice_number(date(), 1), "20240307-000001");
        assert_eq!(invoice_number(date(), 999_999), "20240307-999999");
    }

    #[test]
    fn test_wide_ids_are_not_truncated() {
        assert_eq!(invoice_number(date(), 1_234_567), "20240307-1234567");
    }

    #[test]
    fn test_parse_invoice_number() {
        assert_eq!(parse_invoice_number("20240307-000042").unwrap(), (date(), 42));
        assert_eq!(
            parse_invoice_number(&invoice_number(date(), 1_234_567)).unwrap(),
            (date(), 1_234_567)
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_invoice_number("").is_err());
        assert!(parse_invoice_number("20240307").is_err());
        assert!(parse_invoice_number("20240307-42").is_err());
        assert!(parse_invoice_number("20241307-000042").is_err());
        assert!(parse_invoice_number("2024037-000042").is_err());
        assert!(parse_invoice_number("20240307-00004x").is_err());
    }
}
