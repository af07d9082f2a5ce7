//! # Money Module
//!
//! Provides the `Money` type and the round-half-up rule every monetary
//! computation goes through.
//!
//! ## Why Integer Cents + Decimal?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.225 is stored as 0.22499999999999999167  → rounds to 0.22  ❌      │
//! │                                                                         │
//! │  OUR SOLUTION                                                           │
//! │    "0.75"  ──► Decimal ──► round(2, half-up) ──► 75 cents              │
//! │    150 cents × 0.15 = 22.5 cents (exact Decimal) ──► 23 cents  ✅      │
//! │                                                                         │
//! │  Amounts are stored and added as integer cents.                         │
//! │  Anything fractional (parsing, tax) goes through Decimal and round().  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tienda_core::money::Money;
//! use tienda_core::types::TaxRate;
//!
//! let price = Money::parse("0.75").unwrap();
//! let subtotal = price * 2;                       // $1.50
//! let tax = subtotal.calculate_tax(TaxRate::parse("0.15").unwrap()).unwrap();
//! assert_eq!(tax.cents(), 23);                    // 0.225 → 0.23
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::TaxRate;

/// Number of fractional digits for currency values.
pub const DECIMAL_PLACES: u32 = 2;

/// Rounds a decimal amount to 2 fractional digits using round-half-up.
///
/// Ties round away from zero: `0.225 → 0.23`, `-0.225 → -0.23`.
/// This is NOT bankers rounding (`0.225 → 0.22`).
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use tienda_core::money::round;
///
/// assert_eq!(round(Decimal::new(225, 3)), Decimal::new(23, 2));
/// assert_eq!(round(Decimal::new(2249, 4)), Decimal::new(22, 2));
/// ```
#[inline]
pub fn round(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Money Type
// =============================================================================

/// A currency value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: differences (e.g. stock value deltas) may go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No float constructor**: values come from cents, decimals or text
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► PricedLine.unit_price ──► PricedLine.line_total
///                                                        │
///                              Σ line_total ──► subtotal ┴─► tax ──► total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::money::Money;
    ///
    /// let price = Money::from_cents(165); // $1.65
    /// assert_eq!(price.cents(), 165);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a decimal amount, rounding half-up to cents.
    ///
    /// `None` when the amount does not fit in i64 cents.
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        round(amount)
            .checked_mul(Decimal::ONE_HUNDRED)?
            .to_i64()
            .map(Money)
    }

    /// Parses a textual amount (`"0.75"`, `"1.005"`, `"12"`) into Money.
    ///
    /// The text is read as a decimal literal and rounded half-up; it never
    /// passes through binary floating point.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::money::Money;
    ///
    /// assert_eq!(Money::parse("1.005").unwrap().cents(), 101);
    /// assert_eq!(Money::parse(" 0.75 ").unwrap().cents(), 75);
    /// assert!(Money::parse("abc").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let amount = Decimal::from_str(text).map_err(|e| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: e.to_string(),
        })?;

        Money::from_decimal(amount).ok_or_else(|| ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: i64::MIN / 100,
            max: i64::MAX / 100,
        })
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as an exact 2-place decimal.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, DECIMAL_PLACES)
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax as `round(amount × rate)` with round-half-up.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::money::Money;
    /// use tienda_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(150);          // $1.50
    /// let rate = TaxRate::parse("0.15").unwrap();     // 15%
    ///
    /// // $1.50 × 15% = $0.225 → $0.23
    /// assert_eq!(subtotal.calculate_tax(rate).unwrap().cents(), 23);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Option<Money> {
        Money::from_decimal(self.to_decimal().checked_mul(rate.fraction())?)
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies money by a quantity. Exact in cents; `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(75);
    /// assert_eq!(unit_price.multiply_quantity(2).unwrap().cents(), 150);
    /// assert!(unit_price.multiply_quantity(i64::MAX).is_none());
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `$1.73` / `-$5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up_not_bankers() {
        // 0.225 → 0.23 and 0.235 → 0.24: ties always go up
        assert_eq!(round(Decimal::new(225, 3)), Decimal::new(23, 2));
        assert_eq!(round(Decimal::new(235, 3)), Decimal::new(24, 2));
        assert_eq!(round(Decimal::new(2249, 4)), Decimal::new(22, 2));
    }

    #[test]
    fn test_round_negative_ties_away_from_zero() {
        assert_eq!(round(Decimal::new(-225, 3)), Decimal::new(-23, 2));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("0.75").unwrap().cents(), 75);
        assert_eq!(Money::parse("1.65").unwrap().cents(), 165);
        assert_eq!(Money::parse("12").unwrap().cents(), 1200);
        assert_eq!(Money::parse("1.005").unwrap().cents(), 101);
        assert_eq!(Money::parse("2.675").unwrap().cents(), 268);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Money::parse(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            Money::parse("1,50"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_amounts_beyond_cents_range() {
        // Past Decimal's multiplication range
        assert!(matches!(
            Money::parse("1000000000000000000000000000"),
            Err(ValidationError::OutOfRange { .. })
        ));
        // Parses as Decimal but does not fit in i64 cents
        assert!(matches!(
            Money::parse("92233720368547758.08"),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            Money::parse("-92233720368547758.09"),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(
            Money::parse("92233720368547758.07").unwrap().cents(),
            i64::MAX
        );
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Money::from_cents(i64::MAX);
        assert!(max.checked_add(Money::from_cents(1)).is_none());
        assert!(max.calculate_tax(TaxRate::parse("0.15").unwrap()).is_some());
        assert!(Money::from_cents(100).multiply_quantity(i64::MAX / 50).is_none());
        assert_eq!(
            Money::from_cents(1).checked_add(Money::from_cents(2)),
            Some(Money::from_cents(3))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(173).to_string(), "$1.73");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_to_decimal_is_exact() {
        assert_eq!(Money::from_cents(173).to_decimal(), Decimal::new(173, 2));
    }

    #[test]
    fn test_tax_calculation_rounds_half_up() {
        let rate = TaxRate::parse("0.15").unwrap();
        assert_eq!(Money::from_cents(150).calculate_tax(rate).unwrap().cents(), 23);
        // $1.65 × 15% = 0.2475 → 0.25
        assert_eq!(Money::from_cents(165).calculate_tax(rate).unwrap().cents(), 25);
        // $0.10 × 15% = 0.015 → 0.02
        assert_eq!(Money::from_cents(10).calculate_tax(rate).unwrap().cents(), 2);
    }

    #[test]
    fn test_zero_rate_has_no_tax() {
        let tax = Money::from_cents(999).calculate_tax(TaxRate::zero()).unwrap();
        assert!(tax.is_zero());
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, Money::from_cents(1)].into_iter().sum();
        assert_eq!(total.cents(), 1501);
    }
}
