//! Checkout
//!
//! Prices an order described by [`Settings`]: catalog promotions set the
//! variant prices, cart promotions are applied to the order, then taxes.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    catalog_promotions::{
        CatalogPromotionError, applicator::CatalogPromotionApplicator, scopes::ScopeCheckerRegistry,
    },
    clock::Clock,
    config::{ConfigError, Settings},
    orders::Order,
    promotions::{
        PromotionError, eligibility::CompositePromotionEligibilityChecker, history::OrderHistory,
        processor::PromotionProcessor,
    },
    taxation::{TaxationError, processor::OrderTaxesProcessor, rates::TaxRateResolver},
};

/// Errors raised while pricing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Settings could not be turned into domain values.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Catalog promotions failed.
    #[error(transparent)]
    CatalogPromotion(#[from] CatalogPromotionError),

    /// Cart promotions failed.
    #[error(transparent)]
    Promotion(#[from] PromotionError),

    /// Taxes failed.
    #[error(transparent)]
    Taxation(#[from] TaxationError),
}

/// Build and fully price the order described by `settings`.
///
/// # Errors
///
/// Returns a [`CheckoutError`] if the settings are invalid or any pricing
/// step fails.
pub fn price_order(
    settings: &Settings,
    clock: &Arc<dyn Clock>,
) -> Result<Order<'static>, CheckoutError> {
    let taxons = Arc::new(settings.taxon_tree()?);
    let catalog_promotions = settings.catalog_promotions()?;
    let mut catalog = settings.catalog()?;

    let applicator = CatalogPromotionApplicator::new(
        ScopeCheckerRegistry::with_defaults(taxons),
        Arc::clone(clock),
    );

    for entry in catalog.entries_mut() {
        applicator.apply(&entry.variant, &mut entry.pricing, &catalog_promotions)?;
    }

    let mut order = settings.order(&catalog)?;

    let history: Arc<dyn OrderHistory> = Arc::new(settings.order_history());
    let eligibility =
        CompositePromotionEligibilityChecker::with_defaults(Arc::clone(clock), history);
    let promotions = PromotionProcessor::new(Box::new(eligibility));

    promotions.process(&mut order, &settings.promotions()?)?;

    let resolver = Arc::new(TaxRateResolver::new(
        settings.taxation.tax_rates()?,
        Arc::clone(clock),
    ));
    let taxes = OrderTaxesProcessor::new(
        settings.taxation.strategy,
        resolver,
        settings.taxation.default_zone.clone(),
    );

    taxes.process(&mut order)?;

    info!(order = order.number(), total = order.total_minor(), "priced order");

    Ok(order)
}
