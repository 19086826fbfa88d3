//! Tax Rates

use std::sync::Arc;

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::clock::{Clock, within_window};

/// Which calculator computes tax for a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorKind {
    /// Rounds to whole minor units.
    #[default]
    Default,

    /// Keeps two decimal places of the minor unit until the adjustment is recorded.
    Decimal,
}

/// A tax rate for a tax category within a zone.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxRate {
    /// Tax rate code
    pub code: String,

    /// Tax rate name
    pub name: String,

    /// Fractional amount (0.23 is 23%)
    pub amount: Decimal,

    /// Whether prices already include this tax.
    pub included_in_price: bool,

    /// Calculator used for this rate.
    pub calculator: CalculatorKind,

    /// Tax category this rate applies to.
    pub category: String,

    /// Zone this rate applies in.
    pub zone: String,

    /// Start of validity, if limited.
    pub starts_at: Option<Timestamp>,

    /// End of validity, if limited.
    pub ends_at: Option<Timestamp>,
}

impl TaxRate {
    /// Create an open-ended rate using the default calculator.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        amount: Decimal,
        category: impl Into<String>,
        zone: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            amount,
            included_in_price: false,
            calculator: CalculatorKind::Default,
            category: category.into(),
            zone: zone.into(),
            starts_at: None,
            ends_at: None,
        }
    }

    /// Mark the rate as included in prices.
    #[must_use]
    pub fn included_in_price(mut self) -> Self {
        self.included_in_price = true;
        self
    }

    /// Use a different calculator.
    #[must_use]
    pub fn with_calculator(mut self, calculator: CalculatorKind) -> Self {
        self.calculator = calculator;
        self
    }

    /// Limit the rate to a validity window.
    #[must_use]
    pub fn valid_between(
        mut self,
        starts_at: Option<Timestamp>,
        ends_at: Option<Timestamp>,
    ) -> Self {
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self
    }

    /// Adjustment label, e.g. "VAT (23%)".
    pub fn label(&self) -> String {
        let percent = (self.amount * Decimal::ONE_HUNDRED).normalize();

        format!("{} ({percent}%)", self.name)
    }

    /// Returns whether the rate is valid at `now`.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        within_window(now, self.starts_at, self.ends_at)
    }
}

/// Finds the rate that applies to a tax category in a zone.
#[derive(Debug, Clone)]
pub struct TaxRateResolver {
    rates: Vec<TaxRate>,
    clock: Arc<dyn Clock>,
}

impl TaxRateResolver {
    /// Create a resolver over a set of rates.
    pub fn new(rates: Vec<TaxRate>, clock: Arc<dyn Clock>) -> Self {
        Self { rates, clock }
    }

    /// Resolve the first rate matching the category and zone that is valid now.
    pub fn resolve(&self, category: &str, zone: &str) -> Option<&TaxRate> {
        let now = self.clock.now();

        self.rates
            .iter()
            .find(|rate| rate.category == category && rate.zone == zone && rate.is_valid_at(now))
    }

    /// All configured rates.
    pub fn rates(&self) -> &[TaxRate] {
        &self.rates
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::clock::FixedClock;

    use super::*;

    fn clock(at: &str) -> Result<Arc<dyn Clock>, jiff::Error> {
        Ok(Arc::new(FixedClock(at.parse()?)))
    }

    #[test]
    fn label_shows_percentage() {
        let rate = TaxRate::new("VAT", "VAT", Decimal::new(23, 2), "standard", "EU");

        assert_eq!(rate.label(), "VAT (23%)");
    }

    #[test]
    fn resolves_by_category_and_zone() -> TestResult {
        let resolver = TaxRateResolver::new(
            vec![
                TaxRate::new("UK_VAT", "VAT", Decimal::new(20, 2), "standard", "UK"),
                TaxRate::new("UK_REDUCED", "VAT", Decimal::new(5, 2), "reduced", "UK"),
                TaxRate::new("DE_VAT", "MwSt", Decimal::new(19, 2), "standard", "DE"),
            ],
            clock("2024-06-01T00:00:00Z")?,
        );

        assert_eq!(
            resolver.resolve("reduced", "UK").map(|rate| rate.code.as_str()),
            Some("UK_REDUCED")
        );
        assert_eq!(
            resolver.resolve("standard", "DE").map(|rate| rate.code.as_str()),
            Some("DE_VAT")
        );
        assert!(resolver.resolve("reduced", "DE").is_none());

        Ok(())
    }

    #[test]
    fn skips_rates_outside_their_window() -> TestResult {
        let expired = TaxRate::new("OLD", "VAT", Decimal::new(175, 3), "standard", "UK")
            .valid_between(None, Some("2010-12-31T23:59:59Z".parse()?));

        let current = TaxRate::new("NEW", "VAT", Decimal::new(20, 2), "standard", "UK")
            .valid_between(Some("2011-01-04T00:00:00Z".parse()?), None);

        let resolver = TaxRateResolver::new(vec![expired, current], clock("2024-06-01T00:00:00Z")?);

        assert_eq!(resolver.resolve("standard", "UK").map(|rate| rate.code.as_str()), Some("NEW"));

        Ok(())
    }
}
