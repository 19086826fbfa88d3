//! Settings
//!
//! YAML description of a storefront: tax rates, taxons, products,
//! promotions, catalog promotions, order history and the order to price.
//! Prices are written as `"AMOUNT CURRENCY"` and percentages as `"15%"` or
//! `"0.15"`.

use std::{fs, path::Path};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    catalog::taxons::TaxonError,
    config::{
        catalog::{ProductSettings, TaxonSettings},
        orders::{HistorySettings, OrderSettings},
        promotions::{CatalogPromotionSettings, PromotionSettings},
        taxation::TaxationSettings,
    },
    orders::OrderError,
    pricing::{PricingError, parse_currency, parse_price},
};

pub mod catalog;
pub mod orders;
pub mod promotions;
pub mod taxation;

/// Settings loading and conversion errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the settings file
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price, rate or currency
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Invalid taxon tree
    #[error(transparent)]
    Taxon(#[from] TaxonError),

    /// Invalid order
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A price is in a different currency from the store
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Two variants share a code
    #[error("Duplicate variant code: {0}")]
    DuplicateVariant(String),

    /// An order item refers to a variant that is not defined
    #[error("Variant not found: {0}")]
    VariantNotFound(String),
}

/// Storefront settings
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Channel the order is placed in
    pub channel: String,

    /// Store currency code
    pub currency: String,

    /// Taxation
    #[serde(default)]
    pub taxation: TaxationSettings,

    /// Root taxons, with their children
    #[serde(default)]
    pub taxons: Vec<TaxonSettings>,

    /// Products and their variants
    #[serde(default)]
    pub products: Vec<ProductSettings>,

    /// Cart promotions
    #[serde(default)]
    pub promotions: Vec<PromotionSettings>,

    /// Catalog promotions
    #[serde(default)]
    pub catalog_promotions: Vec<CatalogPromotionSettings>,

    /// Previously placed orders
    #[serde(default)]
    pub history: Vec<HistorySettings>,

    /// The order to price
    pub order: OrderSettings,
}

impl Settings {
    /// Load settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parse settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML does not describe valid settings.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// The store currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency code is not an ISO currency.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        Ok(parse_currency(&self.currency)?)
    }
}

/// Parse a price and check it is in the store currency.
fn price_in(s: &str, currency: &'static Currency) -> Result<i64, ConfigError> {
    let (minor, found) = parse_price(s)?;

    if found != currency {
        return Err(ConfigError::CurrencyMismatch(
            currency.iso_alpha_code.to_string(),
            found.iso_alpha_code.to_string(),
        ));
    }

    Ok(minor)
}

/// Parse per-channel prices into minor units.
fn channel_amounts(
    amounts: &FxHashMap<String, String>,
    currency: &'static Currency,
) -> Result<FxHashMap<String, i64>, ConfigError> {
    amounts
        .iter()
        .map(|(channel, price)| Ok((channel.clone(), price_in(price, currency)?)))
        .collect()
}
