//! Catalog Promotion Scopes
//!
//! A scope names the variants a catalog promotion applies to. Each scope type
//! has a [`VariantInScopeChecker`] registered in a [`ScopeCheckerRegistry`].

use std::{fmt::Debug, sync::Arc};

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::catalog::{ProductVariant, taxons::TaxonTree};

/// Scope type of [`CatalogPromotionScope::ForProducts`].
pub const FOR_PRODUCTS: &str = "for_products";

/// Scope type of [`CatalogPromotionScope::ForVariants`].
pub const FOR_VARIANTS: &str = "for_variants";

/// Scope type of [`CatalogPromotionScope::ForTaxons`].
pub const FOR_TAXONS: &str = "for_taxons";

/// Errors raised while checking scopes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    /// No checker is registered for a scope type.
    #[error("no scope checker registered for scope type {0}")]
    UnknownScopeType(String),

    /// A checker was handed a scope it does not understand.
    #[error("scope checker {checker} cannot evaluate a {scope} scope")]
    UnsupportedScope {
        /// Scope type the checker is registered for
        checker: &'static str,

        /// Scope type it was handed
        scope: String,
    },
}

/// Which variants a catalog promotion applies to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogPromotionScope {
    /// Variants of the listed products.
    ForProducts {
        /// Product codes
        products: Vec<String>,
    },

    /// The listed variants.
    ForVariants {
        /// Variant codes
        variants: Vec<String>,
    },

    /// Variants whose product is in one of the taxons or their descendants.
    ForTaxons {
        /// Taxon codes
        taxons: Vec<String>,
    },

    /// A scope evaluated by a checker registered under `scope_type`.
    Custom {
        /// Registry key of the checker
        scope_type: String,

        /// Free-form configuration
        #[serde(default)]
        configuration: FxHashMap<String, String>,
    },
}

impl CatalogPromotionScope {
    /// Registry key for this scope.
    pub fn scope_type(&self) -> &str {
        match self {
            Self::ForProducts { .. } => FOR_PRODUCTS,
            Self::ForVariants { .. } => FOR_VARIANTS,
            Self::ForTaxons { .. } => FOR_TAXONS,
            Self::Custom { scope_type, .. } => scope_type,
        }
    }

    fn unsupported(&self, checker: &'static str) -> ScopeError {
        ScopeError::UnsupportedScope {
            checker,
            scope: self.scope_type().to_string(),
        }
    }
}

/// Decides whether a variant falls inside one type of scope.
pub trait VariantInScopeChecker: Debug + Send + Sync {
    /// Returns whether `variant` is inside `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnsupportedScope`] if the scope is not of the
    /// type this checker evaluates.
    fn in_scope(
        &self,
        scope: &CatalogPromotionScope,
        variant: &ProductVariant,
    ) -> Result<bool, ScopeError>;
}

/// Checks [`CatalogPromotionScope::ForProducts`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InForProductsScopeChecker;

impl VariantInScopeChecker for InForProductsScopeChecker {
    fn in_scope(
        &self,
        scope: &CatalogPromotionScope,
        variant: &ProductVariant,
    ) -> Result<bool, ScopeError> {
        let CatalogPromotionScope::ForProducts { products } = scope else {
            return Err(scope.unsupported(FOR_PRODUCTS));
        };

        Ok(products.iter().any(|code| code == variant.product().code()))
    }
}

/// Checks [`CatalogPromotionScope::ForVariants`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InForVariantsScopeChecker;

impl VariantInScopeChecker for InForVariantsScopeChecker {
    fn in_scope(
        &self,
        scope: &CatalogPromotionScope,
        variant: &ProductVariant,
    ) -> Result<bool, ScopeError> {
        let CatalogPromotionScope::ForVariants { variants } = scope else {
            return Err(scope.unsupported(FOR_VARIANTS));
        };

        Ok(variants.iter().any(|code| code == variant.code()))
    }
}

/// Checks [`CatalogPromotionScope::ForTaxons`], following the taxon tree down
/// from every configured taxon.
#[derive(Debug, Clone)]
pub struct InForTaxonsScopeChecker {
    taxons: Arc<TaxonTree>,
}

impl InForTaxonsScopeChecker {
    /// Create a checker resolving descendants in `taxons`.
    pub fn new(taxons: Arc<TaxonTree>) -> Self {
        Self { taxons }
    }
}

impl VariantInScopeChecker for InForTaxonsScopeChecker {
    fn in_scope(
        &self,
        scope: &CatalogPromotionScope,
        variant: &ProductVariant,
    ) -> Result<bool, ScopeError> {
        let CatalogPromotionScope::ForTaxons { taxons } = scope else {
            return Err(scope.unsupported(FOR_TAXONS));
        };

        let product_taxons = variant.product().taxons();

        if product_taxons.is_empty() {
            return Ok(false);
        }

        Ok(taxons.iter().any(|configured| {
            let codes = self.taxons.self_and_descendant_codes(configured);

            product_taxons.iter().any(|taxon| codes.contains(taxon.as_str()))
        }))
    }
}

/// Scope checkers keyed by scope type.
#[derive(Debug, Default)]
pub struct ScopeCheckerRegistry {
    checkers: FxHashMap<String, Box<dyn VariantInScopeChecker>>,
}

impl ScopeCheckerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the product, variant and taxon checkers.
    pub fn with_defaults(taxons: Arc<TaxonTree>) -> Self {
        let mut registry = Self::new();

        registry.register(FOR_PRODUCTS, Box::new(InForProductsScopeChecker));
        registry.register(FOR_VARIANTS, Box::new(InForVariantsScopeChecker));
        registry.register(FOR_TAXONS, Box::new(InForTaxonsScopeChecker::new(taxons)));

        registry
    }

    /// Register (or replace) the checker for a scope type.
    pub fn register(
        &mut self,
        scope_type: impl Into<String>,
        checker: Box<dyn VariantInScopeChecker>,
    ) {
        self.checkers.insert(scope_type.into(), checker);
    }

    /// Returns whether `variant` is inside `scope`, using the checker
    /// registered for the scope's type.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownScopeType`] if nothing is registered, or
    /// the checker's own error.
    pub fn in_scope(
        &self,
        scope: &CatalogPromotionScope,
        variant: &ProductVariant,
    ) -> Result<bool, ScopeError> {
        self.checkers
            .get(scope.scope_type())
            .ok_or_else(|| ScopeError::UnknownScopeType(scope.scope_type().to_string()))?
            .in_scope(scope, variant)
    }
}
