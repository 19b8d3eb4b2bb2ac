//! Price amounts in minor currency units.
//!
//! # Invariants
//! - Arithmetic is checked; callers decide how to report overflow.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Amount of money in minor units (for example cents).
///
/// No currency or rounding policy is attached.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Builds an amount from whole and fractional parts, e.g. `(10, 50)` for 10.50.
    ///
    /// Returns `None` when the amount does not fit in minor units.
    pub const fn new(major: i64, minor: i64) -> Option<Self> {
        match major.checked_mul(100) {
            Some(scaled) => match scaled.checked_add(minor) {
                Some(total) => Some(Self(total)),
                None => None,
            },
            None => None,
        }
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Price of `quantity` units at this unit price.
    pub fn checked_mul(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// Sums amounts, stopping at the first overflow.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |total, amount| total.checked_add(amount))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
