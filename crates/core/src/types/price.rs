//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are kept at full precision. Rounding happens only when a price is
//! rendered, so repeated arithmetic on cart totals never compounds rounding
//! error.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (dollars, whole SOL).
    pub amount: Decimal,
    /// Currency the amount is denominated in.
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

    /// A price in US dollars.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// A price in SOL.
    #[must_use]
    pub const fn sol(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::SOL)
    }

    /// The amount rounded to the currency's display precision.
    ///
    /// Midpoints round away from zero, so `$0.125` displays as `$0.13`.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount.round_dp_with_strategy(
            self.currency_code.display_decimals(),
            RoundingStrategy::MidpointAwayFromZero,
        )
    }

    /// The rounded amount without a currency symbol (e.g. `2.50`, `0.0172`).
    #[must_use]
    pub fn display_amount(&self) -> String {
        let places = self.currency_code.display_decimals() as usize;
        format!("{:.places$}", self.rounded())
    }

    /// Convert a USD price into SOL at the given USD-per-SOL rate.
    ///
    /// Returns `None` for non-USD prices and for rates that are not positive.
    #[must_use]
    pub fn to_sol(&self, sol_usd: Decimal) -> Option<Self> {
        if self.currency_code != CurrencyCode::USD || sol_usd <= Decimal::ZERO {
            return None;
        }
        self.amount.checked_div(sol_usd).map(Self::sol)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.currency_code {
            CurrencyCode::USD => write!(f, "${}", self.display_amount()),
            CurrencyCode::SOL => write!(f, "{} SOL", self.display_amount()),
        }
    }
}

/// Currencies the storefront quotes prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    SOL,
}

impl CurrencyCode {
    /// Number of decimal places shown when rendering an amount.
    #[must_use]
    pub const fn display_decimals(self) -> u32 {
        match self {
            Self::USD => 2,
            Self::SOL => 4,
        }
    }

    /// Currency code as shown in listings.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::SOL => "SOL",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_display_pads_to_cents() {
        assert_eq!(Price::usd(Decimal::new(25, 1)).to_string(), "$2.50");
        assert_eq!(Price::usd(Decimal::new(377, 2)).to_string(), "$3.77");
    }

    #[test]
    fn test_usd_display_rounds_midpoint_away_from_zero() {
        assert_eq!(Price::usd(Decimal::new(125, 3)).to_string(), "$0.13");
    }

    #[test]
    fn test_rounding_does_not_touch_amount() {
        let price = Price::usd(Decimal::new(12_345, 4));
        assert_eq!(price.rounded(), Decimal::new(123, 2));
        assert_eq!(price.amount, Decimal::new(12_345, 4));
    }

    #[test]
    fn test_to_sol_uses_four_places() {
        // $2.50 at 145.32 USD/SOL is 0.017203...
        let sol = Price::usd(Decimal::new(25, 1))
            .to_sol(Decimal::new(14_532, 2))
            .unwrap();
        assert_eq!(sol.currency_code, CurrencyCode::SOL);
        assert_eq!(sol.to_string(), "0.0172 SOL");
    }

    #[test]
    fn test_to_sol_rejects_non_positive_rate() {
        let price = Price::usd(Decimal::ONE);
        assert!(price.to_sol(Decimal::ZERO).is_none());
        assert!(price.to_sol(Decimal::NEGATIVE_ONE).is_none());
        assert!(Price::sol(Decimal::ONE).to_sol(Decimal::ONE).is_none());
    }
}
