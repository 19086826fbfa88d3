//! Catalog
//!
//! Products, variants and the taxon hierarchy they are classified under.

use std::sync::Arc;

use smallvec::SmallVec;

pub mod taxons;

/// Taxon codes attached to a product.
pub type TaxonCodes = SmallVec<[String; 4]>;

/// Product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    code: String,
    name: String,
    taxons: TaxonCodes,
}

impl Product {
    /// Create a product classified under the given taxons.
    pub fn new(code: impl Into<String>, name: impl Into<String>, taxons: TaxonCodes) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            taxons,
        }
    }

    /// Product code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Product name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Codes of the taxons this product is classified under.
    pub fn taxons(&self) -> &[String] {
        &self.taxons
    }

    /// Returns whether the product is directly classified under `code`.
    pub fn has_taxon(&self, code: &str) -> bool {
        self.taxons.iter().any(|taxon| taxon == code)
    }
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductVariant {
    code: String,
    name: String,
    product: Arc<Product>,
    tax_category: Option<String>,
}

impl ProductVariant {
    /// Create a variant of `product`.
    pub fn new(code: impl Into<String>, name: impl Into<String>, product: Arc<Product>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            product,
            tax_category: None,
        }
    }

    /// Assign the tax category used to resolve this variant's tax rate.
    #[must_use]
    pub fn with_tax_category(mut self, tax_category: impl Into<String>) -> Self {
        self.tax_category = Some(tax_category.into());
        self
    }

    /// Variant code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Variant name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The product this variant belongs to.
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Tax category code, if the variant is taxable.
    pub fn tax_category(&self) -> Option<&str> {
        self.tax_category.as_deref()
    }
}
