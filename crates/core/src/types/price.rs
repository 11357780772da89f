//! Type-safe price representation using decimal arithmetic.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places shown to customers.
const DISPLAY_SCALE: u32 = 2;

/// A price with currency information.
///
/// Arithmetic stays exact in `Decimal`; rounding only happens when the price
/// is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., reais, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the default currency.
    #[must_use]
    pub fn from_amount(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::default())
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Amount rounded half away from zero to two decimal places.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl std::ops::Add for Price {
    type Output = Self;

    /// Adds two prices. Both operands are expected to share a currency; the
    /// left-hand currency is kept.
    fn add(self, rhs: Self) -> Self {
        Self::new(self.amount + rhs.amount, self.currency_code)
    }
}

impl fmt::Display for Price {
    /// Format for display (e.g., "R$ 19.90").
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.currency_code.symbol(), self.rounded())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BRL,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Symbol shown in front of amounts.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::BRL => "R$",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        let price = Price::from_amount(Decimal::new(10, 0));
        assert_eq!(price.to_string(), "R$ 10.00");

        let price = Price::from_amount(Decimal::new(55, 1));
        assert_eq!(price.to_string(), "R$ 5.50");
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        let price = Price::from_amount(Decimal::new(10_005, 3));
        assert_eq!(price.to_string(), "R$ 10.01");
    }

    #[test]
    fn test_times_and_add() {
        let unit = Price::from_amount(Decimal::new(1990, 2));
        let total = unit.times(3) + Price::from_amount(Decimal::new(550, 2));
        assert_eq!(total.amount, Decimal::new(6520, 2));
        assert_eq!(total.currency_code, CurrencyCode::BRL);
    }

    #[test]
    fn test_serde_keeps_exact_amount() {
        let price = Price::from_amount(Decimal::new(2590, 2));
        let json = serde_json::to_string(&price).unwrap();
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }
}
