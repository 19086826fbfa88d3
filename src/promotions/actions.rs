//! Promotion Actions
//!
//! What an eligible promotion grants. Every discount is recorded as negative
//! adjustments on the units or shipments it reduces, so item totals and taxes
//! see it.

use decimal_percentage::Percentage;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use tracing::trace;

use crate::{
    distribution::{IntegerDistributor, ProportionalIntegerDistributor},
    orders::{
        Order,
        adjustments::{Adjustment, AdjustmentKind, AdjustmentOrigin},
        items::OrderItem,
    },
    pricing::percent_of_minor,
    promotions::{Promotion, PromotionActionError},
};

/// A configured promotion action.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionAction {
    /// Take a fixed amount off the order, per channel.
    OrderFixedDiscount {
        /// Discount per channel code, in minor units
        amounts: FxHashMap<String, i64>,
    },

    /// Take a percentage off the order.
    OrderPercentageDiscount {
        /// Discount percentage
        percentage: Percentage,
    },

    /// Take a fixed amount off every unit, per channel.
    UnitFixedDiscount {
        /// Discount per channel code, in minor units
        amounts: FxHashMap<String, i64>,
    },

    /// Take a percentage off every unit.
    UnitPercentageDiscount {
        /// Discount percentage
        percentage: Percentage,
    },

    /// Take a percentage off shipping.
    ShippingPercentageDiscount {
        /// Discount percentage
        percentage: Percentage,
    },
}

impl PromotionAction {
    /// Apply the action to an order on behalf of `promotion`.
    ///
    /// Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionActionError`] if the discount cannot be calculated
    /// or split across the order.
    pub fn execute(
        &self,
        order: &mut Order<'_>,
        promotion: &Promotion,
    ) -> Result<bool, PromotionActionError> {
        if order.is_empty() {
            return Ok(false);
        }

        match self {
            Self::OrderFixedDiscount { amounts } => {
                let Some(amount) = amounts.get(order.channel()) else {
                    return Ok(false);
                };

                let discount = (*amount).min(order.promotion_subject_total());

                distribute_order_discount(order, discount, promotion)
            }
            Self::OrderPercentageDiscount { percentage } => {
                let subject_total = order.promotion_subject_total();
                let discount = percent_of_minor(percentage, subject_total)?.min(subject_total);

                distribute_order_discount(order, discount, promotion)
            }
            Self::UnitFixedDiscount { amounts } => {
                let Some(amount) = amounts.get(order.channel()).copied() else {
                    return Ok(false);
                };

                discount_units(order, promotion, |_| Ok(amount))
            }
            Self::UnitPercentageDiscount { percentage } => discount_units(order, promotion, |item| {
                Ok(percent_of_minor(percentage, item.unit_price().to_minor_units())?)
            }),
            Self::ShippingPercentageDiscount { percentage } => {
                discount_shipments(order, *percentage, promotion)
            }
        }
    }
}

/// Split an order-level discount across items by their totals, then evenly
/// across each item's units.
fn distribute_order_discount(
    order: &mut Order<'_>,
    discount: i64,
    promotion: &Promotion,
) -> Result<bool, PromotionActionError> {
    if discount <= 0 {
        return Ok(false);
    }

    // Items without units cannot carry a share.
    let weights: Vec<i64> = order
        .items()
        .iter()
        .map(|item| if item.quantity() == 0 { 0 } else { item.total_minor() })
        .collect();

    if weights.iter().all(|weight| *weight == 0) {
        return Ok(false);
    }

    let item_shares = ProportionalIntegerDistributor.distribute(&weights, -discount)?;
    let currency = order.currency();
    let mut applied = false;

    trace!(promotion = %promotion.code, discount, ?item_shares, "splitting order discount");

    for (item, share) in order.items_mut().iter_mut().zip(item_shares) {
        if share == 0 || item.quantity() == 0 {
            continue;
        }

        let unit_shares = IntegerDistributor.distribute(share, item.quantity())?;

        for (unit, amount) in item.units_mut().iter_mut().zip(unit_shares) {
            if amount != 0 {
                unit.add_adjustment(promotion_adjustment(
                    AdjustmentKind::OrderPromotion,
                    amount,
                    promotion,
                    currency,
                ));
                applied = true;
            }
        }
    }

    Ok(applied)
}

/// Discount every unit by the amount `per_unit` returns for its item, never
/// below zero.
fn discount_units(
    order: &mut Order<'_>,
    promotion: &Promotion,
    per_unit: impl Fn(&OrderItem<'_>) -> Result<i64, PromotionActionError>,
) -> Result<bool, PromotionActionError> {
    let currency = order.currency();
    let mut applied = false;

    for item in order.items_mut() {
        let amount = per_unit(item)?;

        if amount <= 0 {
            continue;
        }

        for unit in item.units_mut() {
            let discount = amount.min(unit.total_minor());

            if discount > 0 {
                unit.add_adjustment(promotion_adjustment(
                    AdjustmentKind::OrderUnitPromotion,
                    -discount,
                    promotion,
                    currency,
                ));
                applied = true;
            }
        }
    }

    Ok(applied)
}

fn discount_shipments(
    order: &mut Order<'_>,
    percentage: Percentage,
    promotion: &Promotion,
) -> Result<bool, PromotionActionError> {
    let currency = order.currency();
    let mut applied = false;

    for shipment in order.shipments_mut() {
        let total = shipment.total_minor();

        if total <= 0 {
            continue;
        }

        let discount = percent_of_minor(&percentage, total)?.min(total);

        if discount > 0 {
            shipment.add_adjustment(promotion_adjustment(
                AdjustmentKind::OrderShippingPromotion,
                -discount,
                promotion,
                currency,
            ));
            applied = true;
        }
    }

    Ok(applied)
}

fn promotion_adjustment<'a>(
    kind: AdjustmentKind,
    amount: i64,
    promotion: &Promotion,
    currency: &'a Currency,
) -> Adjustment<'a> {
    Adjustment::new(
        kind,
        promotion.name.clone(),
        Money::from_minor(amount, currency),
        false,
        AdjustmentOrigin::Promotion {
            code: promotion.code.clone(),
        },
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rusty_money::iso::GBP;
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{
        catalog::{Product, ProductVariant},
        orders::{OrderError, Shipment},
    };

    use super::*;

    fn item(code: &str, price: i64, quantity: usize) -> OrderItem<'static> {
        OrderItem::new(
            ProductVariant::new(code, code, Arc::new(Product::new(code, code, smallvec![]))),
            Money::from_minor(price, GBP),
            quantity,
        )
    }

    fn order() -> Result<Order<'static>, OrderError> {
        let mut order = Order::new("1", "WEB", GBP);

        order.add_item(item("MUG", 1000, 2))?;
        order.add_item(item("CAP", 500, 1))?;

        Ok(order)
    }

    fn amounts(amount: i64) -> FxHashMap<String, i64> {
        let mut amounts = FxHashMap::default();
        amounts.insert("WEB".to_string(), amount);
        amounts
    }

    fn unit_totals(order: &Order<'_>) -> Vec<Vec<i64>> {
        order.items().iter().map(OrderItem::unit_totals).collect()
    }

    fn promotion() -> Promotion {
        Promotion::new("SUMMER", "Summer sale", &["WEB"])
    }

    #[test]
    fn order_fixed_discount_is_split_by_item_totals() -> TestResult {
        let mut order = order()?;
        let action = PromotionAction::OrderFixedDiscount { amounts: amounts(1000) };

        assert!(action.execute(&mut order, &promotion())?);

        assert_eq!(unit_totals(&order), vec![vec![600, 600], vec![300]]);
        assert_eq!(order.adjustments_total_recursively(AdjustmentKind::OrderPromotion), -1000);
        assert_eq!(order.total_minor(), 1500);

        Ok(())
    }

    #[test]
    fn order_discount_skips_items_without_units() -> TestResult {
        let mut order = Order::new("1", "WEB", GBP);
        order.add_item(item("EMPTY", 500, 0))?;
        order.add_item(item("A", 100, 1))?;
        order.add_item(item("B", 100, 1))?;

        let action = PromotionAction::OrderFixedDiscount { amounts: amounts(101) };

        assert!(action.execute(&mut order, &promotion())?);
        assert_eq!(order.adjustments_total_recursively(AdjustmentKind::OrderPromotion), -101);
        assert_eq!(order.total_minor(), 99);

        Ok(())
    }

    #[test]
    fn order_discount_leaves_free_items_alone() -> TestResult {
        let mut order = Order::new("1", "WEB", GBP);
        order.add_item(item("FREE", 0, 1))?;
        order.add_item(item("A", 100, 1))?;
        order.add_item(item("B", 100, 1))?;

        let action = PromotionAction::OrderFixedDiscount { amounts: amounts(101) };

        assert!(action.execute(&mut order, &promotion())?);
        assert_eq!(unit_totals(&order), vec![vec![0], vec![49], vec![50]]);

        Ok(())
    }

    #[test]
    fn order_fixed_discount_is_capped_at_subject_total() -> TestResult {
        let mut order = order()?;
        let action = PromotionAction::OrderFixedDiscount { amounts: amounts(10_000) };

        assert!(action.execute(&mut order, &promotion())?);
        assert_eq!(order.total_minor(), 0);

        Ok(())
    }

    #[test]
    fn order_fixed_discount_needs_channel_amount() -> TestResult {
        let mut order = Order::new("1", "POS", GBP);
        order.add_item(item("MUG", 1000, 1))?;

        let action = PromotionAction::OrderFixedDiscount { amounts: amounts(100) };

        assert!(!action.execute(&mut order, &promotion())?);
        assert_eq!(order.total_minor(), 1000);

        Ok(())
    }

    #[test]
    fn order_percentage_discount() -> TestResult {
        let mut order = order()?;
        let action = PromotionAction::OrderPercentageDiscount {
            percentage: Percentage::from(0.1),
        };

        assert!(action.execute(&mut order, &promotion())?);

        assert_eq!(unit_totals(&order), vec![vec![900, 900], vec![450]]);
        assert_eq!(order.total_minor(), 2250);

        Ok(())
    }

    #[test]
    fn unit_fixed_discount_never_goes_below_zero() -> TestResult {
        let mut order = order()?;
        let action = PromotionAction::UnitFixedDiscount { amounts: amounts(700) };

        assert!(action.execute(&mut order, &promotion())?);

        assert_eq!(unit_totals(&order), vec![vec![300, 300], vec![0]]);
        assert_eq!(order.adjustments_total_recursively(AdjustmentKind::OrderUnitPromotion), -1900);

        Ok(())
    }

    #[test]
    fn unit_percentage_discount_uses_unit_price() -> TestResult {
        let mut order = order()?;
        let action = PromotionAction::UnitPercentageDiscount {
            percentage: Percentage::from(0.25),
        };

        assert!(action.execute(&mut order, &promotion())?);

        assert_eq!(unit_totals(&order), vec![vec![750, 750], vec![375]]);

        Ok(())
    }

    #[test]
    fn shipping_percentage_discount() -> TestResult {
        let mut order = order()?;
        let mut shipment = Shipment::new("ups");

        shipment.add_adjustment(Adjustment::new(
            AdjustmentKind::Shipping,
            "UPS",
            Money::from_minor(500, GBP),
            false,
            AdjustmentOrigin::Manual,
        ));
        order.add_shipment(shipment);
        order.add_shipment(Shipment::new("collect"));

        let action = PromotionAction::ShippingPercentageDiscount {
            percentage: Percentage::from(0.5),
        };

        assert!(action.execute(&mut order, &promotion())?);
        assert_eq!(order.shipping_total_minor(), 250);
        assert_eq!(
            order.adjustments_total_recursively(AdjustmentKind::OrderShippingPromotion),
            -250
        );

        Ok(())
    }

    #[test]
    fn empty_orders_are_left_alone() -> TestResult {
        let mut order = Order::new("1", "WEB", GBP);
        let action = PromotionAction::OrderFixedDiscount { amounts: amounts(100) };

        assert!(!action.execute(&mut order, &promotion())?);

        Ok(())
    }

    #[test]
    fn discounts_record_their_promotion() -> TestResult {
        let mut order = order()?;
        let action = PromotionAction::UnitFixedDiscount { amounts: amounts(100) };

        action.execute(&mut order, &promotion())?;

        let adjustment = order
            .items()
            .first()
            .and_then(|item| item.units().first())
            .and_then(|unit| unit.adjustments().first());

        assert_eq!(adjustment.map(Adjustment::label), Some("Summer sale"));
        assert_eq!(
            adjustment.map(Adjustment::origin),
            Some(&AdjustmentOrigin::Promotion {
                code: "SUMMER".to_string()
            })
        );

        Ok(())
    }
}
