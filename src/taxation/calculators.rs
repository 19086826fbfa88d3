//! Tax Calculators

use std::fmt::Debug;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    pricing::PricingError,
    taxation::rates::{CalculatorKind, TaxRate},
};

/// Calculates the tax owed on a base amount.
pub trait TaxCalculator: Debug + Send + Sync {
    /// Tax on `base` minor units, possibly fractional.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the calculation overflows.
    fn calculate(&self, base: i64, rate: &TaxRate) -> Result<Decimal, PricingError>;
}

/// Tax in whole minor units, rounded half away from zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCalculator;

impl TaxCalculator for DefaultCalculator {
    fn calculate(&self, base: i64, rate: &TaxRate) -> Result<Decimal, PricingError> {
        Ok(unrounded(base, rate)?.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    }
}

/// Tax kept to two decimal places of a minor unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalCalculator;

impl TaxCalculator for DecimalCalculator {
    fn calculate(&self, base: i64, rate: &TaxRate) -> Result<Decimal, PricingError> {
        Ok(unrounded(base, rate)?.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

/// Picks the calculator named by the rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelegatingCalculator {
    default: DefaultCalculator,
    decimal: DecimalCalculator,
}

impl TaxCalculator for DelegatingCalculator {
    fn calculate(&self, base: i64, rate: &TaxRate) -> Result<Decimal, PricingError> {
        match rate.calculator {
            CalculatorKind::Default => self.default.calculate(base, rate),
            CalculatorKind::Decimal => self.decimal.calculate(base, rate),
        }
    }
}

/// Excluded: `base * rate`. Included: the tax portion of `base`, `base - base / (1 + rate)`.
fn unrounded(base: i64, rate: &TaxRate) -> Result<Decimal, PricingError> {
    let base = Decimal::from(base);

    if rate.included_in_price {
        Decimal::ONE
            .checked_add(rate.amount)
            .and_then(|divisor| base.checked_div(divisor))
            .and_then(|net| base.checked_sub(net))
            .ok_or(PricingError::Overflow)
    } else {
        base.checked_mul(rate.amount).ok_or(PricingError::Overflow)
    }
}
