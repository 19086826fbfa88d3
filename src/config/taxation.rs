//! Taxation Settings

use jiff::Timestamp;
use serde::Deserialize;

use crate::{
    config::ConfigError,
    pricing::parse_rate,
    taxation::{
        processor::TaxCalculationStrategy,
        rates::{CalculatorKind, TaxRate},
    },
};

/// Taxation settings
#[derive(Debug, Default, Deserialize)]
pub struct TaxationSettings {
    /// How item taxes are calculated
    #[serde(default)]
    pub strategy: TaxCalculationStrategy,

    /// Zone used when the order has none
    #[serde(default)]
    pub default_zone: Option<String>,

    /// Tax rates
    #[serde(default)]
    pub rates: Vec<TaxRateSettings>,
}

impl TaxationSettings {
    /// Build the configured tax rates.
    ///
    /// # Errors
    ///
    /// Returns an error if a rate amount cannot be parsed.
    pub fn tax_rates(&self) -> Result<Vec<TaxRate>, ConfigError> {
        self.rates.iter().map(TaxRate::try_from).collect()
    }
}

/// Tax rate settings
#[derive(Debug, Deserialize)]
pub struct TaxRateSettings {
    /// Tax rate code
    pub code: String,

    /// Tax rate name
    pub name: String,

    /// Rate, e.g. "23%" or "0.23"
    pub amount: String,

    /// Tax category code
    pub category: String,

    /// Zone code
    pub zone: String,

    /// Whether prices already include the tax
    #[serde(default)]
    pub included_in_price: bool,

    /// Calculator
    #[serde(default)]
    pub calculator: CalculatorKind,

    /// Start of validity
    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    /// End of validity
    #[serde(default)]
    pub ends_at: Option<Timestamp>,
}

impl TryFrom<&TaxRateSettings> for TaxRate {
    type Error = ConfigError;

    fn try_from(settings: &TaxRateSettings) -> Result<Self, Self::Error> {
        let mut rate = TaxRate::new(
            settings.code.clone(),
            settings.name.clone(),
            parse_rate(&settings.amount)?,
            settings.category.clone(),
            settings.zone.clone(),
        )
        .with_calculator(settings.calculator)
        .valid_between(settings.starts_at, settings.ends_at);

        if settings.included_in_price {
            rate = rate.included_in_price();
        }

        Ok(rate)
    }
}
