//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The system of record we replaced stored amounts as floats:             │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  The outstanding-balance invariant                                      │
//! │    balance == Σ(credit sales) − Σ(payments)                             │
//! │  cannot be held exactly under float drift.                              │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Kobo                                             │
//! │    ₦10.99 is stored as 1099 kobo, everywhere, always.                   │
//! │    Every sum the ledger takes is exact.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasuwa_core::money::Money;
//!
//! // Create from kobo (preferred)
//! let price = Money::from_kobo(1099); // ₦10.99
//!
//! // Arithmetic operations
//! let line_total = price * 3;                       // ₦32.97
//! let total = line_total + Money::from_kobo(500);   // ₦37.97
//!
//! // NEVER do this:
//! // let bad = Money::from_float(10.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in kobo (the smallest naira unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative intermediate values for deltas
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// Every monetary value in the system flows through this type:
/// product prices, sale totals, discounts, credit amounts, payments,
/// credit limits, and outstanding balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from kobo (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use kasuwa_core::money::Money;
    ///
    /// let price = Money::from_kobo(1099); // Represents ₦10.99
    /// assert_eq!(price.kobo(), 1099);
    /// ```
    #[inline]
    pub const fn from_kobo(kobo: i64) -> Self {
        Money(kobo)
    }

    /// Creates a Money value from whole naira.
    ///
    /// ## Example
    /// ```rust
    /// use kasuwa_core::money::Money;
    ///
    /// let price = Money::from_naira(80);
    /// assert_eq!(price.kobo(), 8000);
    /// ```
    #[inline]
    pub const fn from_naira(naira: i64) -> Self {
        Money(naira * 100)
    }

    /// Returns the value in kobo.
    #[inline]
    pub const fn kobo(&self) -> i64 {
        self.0
    }

    /// Returns the whole-naira portion.
    #[inline]
    pub const fn naira(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the kobo portion (always 0-99).
    #[inline]
    pub const fn kobo_part(&self) -> i64 {
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kasuwa_core::money::Money;
    ///
    /// let unit_price = Money::from_kobo(1000); // ₦10.00
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.kobo(), 3000); // ₦30.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Subtracts a discount, flooring at zero.
    ///
    /// Discounts never produce a negative total: a ₦50 discount on a
    /// ₦30 sale yields ₦0, not -₦20.
    ///
    /// ## Example
    /// ```rust
    /// use kasuwa_core::money::Money;
    ///
    /// let subtotal = Money::from_kobo(3000);
    /// assert_eq!(subtotal.less_discount(Money::from_kobo(500)).kobo(), 2500);
    /// assert_eq!(subtotal.less_discount(Money::from_kobo(5000)).kobo(), 0);
    /// ```
    #[inline]
    pub fn less_discount(&self, discount: Money) -> Money {
        Money((self.0 - discount.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// User-facing error messages (credit limit, overpayment) embed this
/// formatting directly, so it carries the currency sign.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₦{}.{:02}", sign, self.naira().abs(), self.kobo_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kobo() {
        let money = Money::from_kobo(1099);
        assert_eq!(money.kobo(), 1099);
        assert_eq!(money.naira(), 10);
        assert_eq!(money.kobo_part(), 99);
    }

    #[test]
    fn test_from_naira() {
        assert_eq!(Money::from_naira(80).kobo(), 8000);
        assert_eq!(Money::from_naira(0).kobo(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_kobo(1099)), "₦10.99");
        assert_eq!(format!("{}", Money::from_kobo(500)), "₦5.00");
        assert_eq!(format!("{}", Money::from_kobo(-550)), "-₦5.50");
        assert_eq!(format!("{}", Money::from_kobo(0)), "₦0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_kobo(1000);
        let b = Money::from_kobo(500);

        assert_eq!((a + b).kobo(), 1500);
        assert_eq!((a - b).kobo(), 500);
        let result: Money = a * 3;
        assert_eq!(result.kobo(), 3000);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_kobo(299);
        let line_total = unit_price.multiply_quantity(3);
        assert_eq!(line_total.kobo(), 897);
    }

    #[test]
    fn test_less_discount_floors_at_zero() {
        let subtotal = Money::from_kobo(3000);
        assert_eq!(subtotal.less_discount(Money::from_kobo(500)).kobo(), 2500);
        assert_eq!(subtotal.less_discount(Money::from_kobo(3000)).kobo(), 0);
        assert_eq!(subtotal.less_discount(Money::from_kobo(9999)).kobo(), 0);
        assert_eq!(subtotal.less_discount(Money::zero()).kobo(), 3000);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_kobo(100);
        assert!(positive.is_positive());

        let negative = Money::from_kobo(-100);
        assert!(negative.is_negative());
    }
}
