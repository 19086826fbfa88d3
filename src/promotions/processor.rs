//! Promotion Processor

use std::cmp::Reverse;

use tracing::debug;

use crate::{
    orders::{Order, adjustments::AdjustmentKind},
    promotions::{Promotion, PromotionError, eligibility::PromotionEligibilityChecker},
};

const PROMOTION_KINDS: [AdjustmentKind; 4] = [
    AdjustmentKind::OrderPromotion,
    AdjustmentKind::OrderItemPromotion,
    AdjustmentKind::OrderUnitPromotion,
    AdjustmentKind::OrderShippingPromotion,
];

/// Clears and reapplies the promotions of an order.
#[derive(Debug)]
pub struct PromotionProcessor {
    checker: Box<dyn PromotionEligibilityChecker>,
}

impl PromotionProcessor {
    /// Create a processor deciding eligibility with `checker`.
    pub fn new(checker: Box<dyn PromotionEligibilityChecker>) -> Self {
        Self { checker }
    }

    /// Remove previous promotion discounts and apply the eligible promotions.
    ///
    /// Promotions are considered highest priority first. The first eligible
    /// exclusive promotion is applied alone; otherwise every eligible
    /// non-exclusive promotion is applied.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionError`] if eligibility cannot be decided or an
    /// action fails.
    #[tracing::instrument(skip_all, fields(order = order.number()))]
    pub fn process(
        &self,
        order: &mut Order<'_>,
        promotions: &[Promotion],
    ) -> Result<(), PromotionError> {
        for kind in PROMOTION_KINDS {
            order.remove_adjustments_recursively(kind);
        }

        order.clear_promotions();

        if order.is_empty() {
            return Ok(());
        }

        let mut candidates: Vec<&Promotion> = promotions.iter().collect();
        candidates.sort_by_key(|promotion| Reverse(promotion.priority));

        for promotion in candidates.iter().filter(|promotion| promotion.exclusive) {
            if self.checker.is_eligible(order, promotion)? {
                debug!(promotion = %promotion.code, "applying exclusive promotion");
                apply(order, promotion)?;

                return Ok(());
            }
        }

        for promotion in candidates.iter().filter(|promotion| !promotion.exclusive) {
            if self.checker.is_eligible(order, promotion)? {
                apply(order, promotion)?;
            }
        }

        debug!(promotions = ?order.promotions(), "applied promotions");

        Ok(())
    }
}

fn apply(order: &mut Order<'_>, promotion: &Promotion) -> Result<(), PromotionError> {
    let mut applied = false;

    for action in &promotion.actions {
        applied |= action.execute(order, promotion)?;
    }

    if applied {
        order.add_promotion(&promotion.code);
    }

    Ok(())
}
