//! Catalog Promotion Applicator

use std::{cmp::Reverse, sync::Arc};

use tracing::{debug, trace};

use crate::{
    catalog::ProductVariant,
    catalog_promotions::{
        CatalogPromotion, CatalogPromotionError, ChannelPricing, scopes::ScopeCheckerRegistry,
    },
    clock::{Clock, within_window},
};

/// Applies the active catalog promotions to a variant's channel pricing.
#[derive(Debug)]
pub struct CatalogPromotionApplicator {
    scopes: ScopeCheckerRegistry,
    clock: Arc<dyn Clock>,
}

impl CatalogPromotionApplicator {
    /// Create an applicator deciding scope membership with `scopes`.
    pub fn new(scopes: ScopeCheckerRegistry, clock: Arc<dyn Clock>) -> Self {
        Self { scopes, clock }
    }

    /// Returns whether a promotion is enabled, runs in `channel` and is
    /// inside its date window.
    pub fn is_active(&self, promotion: &CatalogPromotion, channel: &str) -> bool {
        promotion.enabled
            && promotion.has_channel(channel)
            && within_window(self.clock.now(), promotion.starts_at, promotion.ends_at)
    }

    /// Returns whether `variant` is inside any of the promotion's scopes.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogPromotionError::Scope`] if a scope cannot be checked.
    pub fn is_eligible(
        &self,
        variant: &ProductVariant,
        promotion: &CatalogPromotion,
    ) -> Result<bool, CatalogPromotionError> {
        for scope in &promotion.scopes {
            if self.scopes.in_scope(scope, variant)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Reset `pricing` and apply every active promotion covering `variant`.
    ///
    /// Promotions are applied highest priority first. When an exclusive one
    /// is among them, only the first exclusive promotion is applied.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogPromotionError`] if scopes cannot be checked or a
    /// discount cannot be calculated.
    #[tracing::instrument(skip_all, fields(variant = variant.code(), channel = pricing.channel()))]
    pub fn apply(
        &self,
        variant: &ProductVariant,
        pricing: &mut ChannelPricing<'_>,
        promotions: &[CatalogPromotion],
    ) -> Result<(), CatalogPromotionError> {
        pricing.reset();

        let mut candidates = Vec::new();

        for promotion in promotions {
            if self.is_active(promotion, pricing.channel())
                && self.is_eligible(variant, promotion)?
            {
                candidates.push(promotion);
            }
        }

        candidates.sort_by_key(|promotion| Reverse(promotion.priority));

        if let Some(exclusive) = candidates.iter().copied().find(|promotion| promotion.exclusive) {
            candidates = vec![exclusive];
        }

        for promotion in candidates {
            for action in &promotion.actions {
                let price = action.discounted(pricing.price().to_minor_units(), pricing.channel())?;

                if pricing.apply(&promotion.code, price) {
                    trace!(promotion = %promotion.code, price, "applied catalog promotion action");
                } else {
                    trace!(promotion = %promotion.code, "catalog promotion action kept the price");
                }
            }
        }

        debug!(
            price = pricing.price().to_minor_units(),
            applied = ?pricing.applied_promotions(),
            "priced variant"
        );

        Ok(())
    }
}
