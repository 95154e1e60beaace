//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  0.1 + 0.2 = 0.30000000000000004   ← floats drift on every sum          │
//! │                                                                         │
//! │  10 + 20 = 30 (centavos)           ← integers are exact                 │
//! │                                                                         │
//! │  The payments summary adds hundreds of incomes, expenses and tickets.  │
//! │  All of them are stored and summed as i64 centavos.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mesa_core::money::Money;
//!
//! let price = Money::from_cents(125_050); // $ 1.250,50
//! let doubled = price * 2;
//! let total = price + Money::from_cents(500);
//! assert_eq!(doubled.cents(), 250_100);
//! assert_eq!(total.cents(), 125_550);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in centavos.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for withdrawals and expenses
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Transparent serde**: Serialized as a bare integer on the wire
///
/// ## Where Money is Used
/// ```text
/// OrderLine.unit_price ──► line total ──► Order.total ──► Ticket.total
///                                                           │
/// Income.amount / Expense.amount ──────────────────────────►│
///                                                           ▼
///                                              PaymentsSummary (dinero, ventas)
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use mesa_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole pesos.
    #[inline]
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos * 100)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole pesos portion (truncated toward zero).
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
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
    /// use mesa_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display renders the es-AR format used on tickets and the dashboard:
/// `$ 1.234,56`, with `.` as thousands separator and `,` for centavos.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.pesos().unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        write!(f, "{}$ {},{:02}", sign, grouped, self.cents_part())
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
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
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pesos() {
        assert_eq!(Money::from_pesos(15).cents(), 1500);
    }

    #[test]
    fn test_parts() {
        let m = Money::from_cents(-1550);
        assert_eq!(m.pesos(), -15);
        assert_eq!(m.cents_part(), 50);
        assert!(m.is_negative());
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_cents(0).to_string(), "$ 0,00");
        assert_eq!(Money::from_cents(99).to_string(), "$ 0,99");
        assert_eq!(Money::from_cents(123_456).to_string(), "$ 1.234,56");
        assert_eq!(Money::from_cents(123_456_789).to_string(), "$ 1.234.567,89");
        assert_eq!(Money::from_cents(-250_000).to_string(), "-$ 2.500,00");
    }

    #[test]
    fn test_arithmetic() {
        let mut a = Money::from_cents(1000);
        a += Money::from_cents(250);
        a -= Money::from_cents(50);
        assert_eq!(a.cents(), 1200);
        assert_eq!((a * 3).cents(), 3600);
        assert_eq!((-a).cents(), -1200);
    }

    #[test]
    fn test_sum() {
        let values = vec![Money::from_cents(100), Money::from_cents(250)];
        let by_ref: Money = values.iter().sum();
        let by_val: Money = values.into_iter().sum();
        assert_eq!(by_ref.cents(), 350);
        assert_eq!(by_val, by_ref);
    }

    #[test]
    fn test_checked_arithmetic() {
        let price = Money::from_cents(i64::MAX / 2);
        assert_eq!(Money::from_cents(299).checked_multiply_quantity(3), Some(Money::from_cents(897)));
        assert_eq!(price.checked_multiply_quantity(3), None);
        assert_eq!(price.checked_add(price), Some(Money::from_cents(i64::MAX - 1)));
        assert_eq!(price.checked_add(Money::from_cents(i64::MAX)), None);
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_cents(4200)).unwrap();
        assert_eq!(json, "4200");
    }
}
