//! Catalog Settings

use std::sync::Arc;

use rustc_hash::FxHashSet;
use rusty_money::Money;
use serde::Deserialize;

use crate::{
    catalog::{Product, ProductVariant, taxons::TaxonTree},
    catalog_promotions::ChannelPricing,
    config::{ConfigError, Settings, price_in},
};

/// Taxon settings
#[derive(Debug, Deserialize)]
pub struct TaxonSettings {
    /// Taxon code
    pub code: String,

    /// Taxon name
    pub name: String,

    /// Child taxons
    #[serde(default)]
    pub children: Vec<TaxonSettings>,
}

/// Product settings
#[derive(Debug, Deserialize)]
pub struct ProductSettings {
    /// Product code
    pub code: String,

    /// Product name
    pub name: String,

    /// Taxon codes
    #[serde(default)]
    pub taxons: Vec<String>,

    /// Variants
    #[serde(default)]
    pub variants: Vec<VariantSettings>,
}

/// Variant settings
#[derive(Debug, Deserialize)]
pub struct VariantSettings {
    /// Variant code
    pub code: String,

    /// Variant name
    pub name: String,

    /// Channel price, e.g. "10.00 GBP"
    pub price: String,

    /// Lowest price catalog promotions may reach
    #[serde(default)]
    pub minimum_price: Option<String>,

    /// Tax category code
    #[serde(default)]
    pub tax_category: Option<String>,
}

/// A variant with its price in the configured channel.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// The variant
    pub variant: ProductVariant,

    /// Its channel pricing
    pub pricing: ChannelPricing<'static>,
}

/// Every configured variant, in definition order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Find a variant by code.
    pub fn get(&self, code: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.variant.code() == code)
    }

    /// All entries.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// All entries, mutably.
    pub fn entries_mut(&mut self) -> &mut [CatalogEntry] {
        &mut self.entries
    }
}

impl Settings {
    /// Build the taxon tree.
    ///
    /// # Errors
    ///
    /// Returns an error if a taxon code is used twice.
    pub fn taxon_tree(&self) -> Result<TaxonTree, ConfigError> {
        let mut tree = TaxonTree::new();

        for root in &self.taxons {
            tree.add_root(&root.code, &root.name)?;
            add_children(&mut tree, root)?;
        }

        Ok(tree)
    }

    /// Build every variant with its channel pricing.
    ///
    /// # Errors
    ///
    /// Returns an error if a price is invalid or in another currency, or if
    /// two variants share a code.
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        let currency = self.currency()?;
        let mut seen = FxHashSet::default();
        let mut entries = Vec::new();

        for product_settings in &self.products {
            let product = Arc::new(Product::new(
                product_settings.code.clone(),
                product_settings.name.clone(),
                product_settings.taxons.iter().cloned().collect(),
            ));

            for variant_settings in &product_settings.variants {
                if !seen.insert(variant_settings.code.as_str()) {
                    return Err(ConfigError::DuplicateVariant(variant_settings.code.clone()));
                }

                let mut variant = ProductVariant::new(
                    variant_settings.code.clone(),
                    variant_settings.name.clone(),
                    Arc::clone(&product),
                );

                if let Some(tax_category) = &variant_settings.tax_category {
                    variant = variant.with_tax_category(tax_category.clone());
                }

                let price = price_in(&variant_settings.price, currency)?;
                let mut pricing =
                    ChannelPricing::new(self.channel.clone(), Money::from_minor(price, currency));

                if let Some(minimum_price) = &variant_settings.minimum_price {
                    let minimum_price = price_in(minimum_price, currency)?;
                    pricing =
                        pricing.with_minimum_price(Money::from_minor(minimum_price, currency));
                }

                entries.push(CatalogEntry { variant, pricing });
            }
        }

        Ok(Catalog { entries })
    }
}

fn add_children(tree: &mut TaxonTree, parent: &TaxonSettings) -> Result<(), ConfigError> {
    for child in &parent.children {
        tree.add_child(&parent.code, &child.code, &child.name)?;
        add_children(tree, child)?;
    }

    Ok(())
}
