//! Non-negative decimal quantity value object.
//!
//! Stock levels and invoice line quantities are decimals (goods can be sold
//! in fractional units, e.g. 0.25 kg), but they must never be negative in any
//! committed state. `Quantity` makes the non-negative invariant a type-level
//! fact: the only way to "subtract below zero" is `checked_sub`, which refuses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A non-negative decimal quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    /// Construct from a decimal; rejects negative values.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value < Decimal::ZERO {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(Self(value))
    }

    /// Construct from a decimal; rejects zero and negative values.
    ///
    /// Requested decrements and refills must be strictly positive.
    pub fn positive(value: Decimal) -> DomainResult<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(Self(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Add, failing on decimal overflow.
    pub fn checked_add(self, other: Quantity) -> DomainResult<Quantity> {
        self.0
            .checked_add(other.0)
            .map(Quantity)
            .ok_or_else(|| DomainError::invariant("quantity overflow"))
    }

    /// Subtract; `None` when the result would be negative.
    ///
    /// This is the value-level mirror of the storage layer's conditional
    /// update: the check and the subtraction are one operation.
    pub fn checked_sub(self, other: Quantity) -> Option<Quantity> {
        if other.0 > self.0 {
            return None;
        }
        // Cannot underflow past zero after the guard above.
        self.0.checked_sub(other.0).map(Quantity)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Quantity::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
