//! Tax Applicators
//!
//! Each applicator records tax for one part of an order: items, units or
//! shipments.

use std::{fmt::Debug, sync::Arc};

use rusty_money::{Money, iso::Currency};
use tracing::trace;

use crate::{
    distribution::{IntegerDistributor, ProportionalIntegerDistributor},
    orders::{
        Order,
        adjustments::{Adjustment, AdjustmentKind, AdjustmentOrigin},
    },
    pricing::{round_minor, sum_minor},
    taxation::{
        TaxationError,
        calculators::TaxCalculator,
        rates::{TaxRate, TaxRateResolver},
    },
};

/// Applies tax adjustments to an order within a tax zone.
pub trait OrderTaxesApplicator: Debug + Send + Sync {
    /// Record taxes on `order` for rates valid in `zone`.
    ///
    /// # Errors
    ///
    /// Returns a [`TaxationError`] if tax cannot be calculated or split.
    fn apply(&self, order: &mut Order<'_>, zone: &str) -> Result<(), TaxationError>;
}

/// Taxes each item's total once and spreads the result over its units,
/// proportionally to the unit totals.
#[derive(Debug, Clone)]
pub struct OrderItemsTaxesApplicator {
    resolver: Arc<TaxRateResolver>,
    calculator: Arc<dyn TaxCalculator>,
}

impl OrderItemsTaxesApplicator {
    /// Create an items applicator.
    pub fn new(resolver: Arc<TaxRateResolver>, calculator: Arc<dyn TaxCalculator>) -> Self {
        Self {
            resolver,
            calculator,
        }
    }
}

impl OrderTaxesApplicator for OrderItemsTaxesApplicator {
    fn apply(&self, order: &mut Order<'_>, zone: &str) -> Result<(), TaxationError> {
        let currency = order.currency();

        for item in order.items_mut() {
            if item.quantity() == 0 {
                return Err(TaxationError::EmptyItem(item.variant().code().to_string()));
            }

            let Some(rate) = item
                .variant()
                .tax_category()
                .and_then(|category| self.resolver.resolve(category, zone))
            else {
                continue;
            };

            let tax = round_minor(self.calculator.calculate(item.total_minor(), rate)?)?;

            if tax == 0 {
                continue;
            }

            let unit_totals = item.unit_totals();

            let shares = if sum_minor(unit_totals.iter().copied())? == 0 {
                IntegerDistributor.distribute(tax, unit_totals.len())?
            } else {
                ProportionalIntegerDistributor.distribute(&unit_totals, tax)?
            };

            trace!(variant = item.variant().code(), rate = %rate.code, tax, ?shares, "taxing item");

            for (unit, share) in item.units_mut().iter_mut().zip(shares) {
                if share != 0 {
                    unit.add_adjustment(tax_adjustment(share, rate, currency));
                }
            }
        }

        Ok(())
    }
}

/// Taxes every unit separately.
#[derive(Debug, Clone)]
pub struct OrderItemUnitsTaxesApplicator {
    resolver: Arc<TaxRateResolver>,
    calculator: Arc<dyn TaxCalculator>,
}

impl OrderItemUnitsTaxesApplicator {
    /// Create a units applicator.
    pub fn new(resolver: Arc<TaxRateResolver>, calculator: Arc<dyn TaxCalculator>) -> Self {
        Self {
            resolver,
            calculator,
        }
    }
}

impl OrderTaxesApplicator for OrderItemUnitsTaxesApplicator {
    fn apply(&self, order: &mut Order<'_>, zone: &str) -> Result<(), TaxationError> {
        let currency = order.currency();

        for item in order.items_mut() {
            let Some(rate) = item
                .variant()
                .tax_category()
                .and_then(|category| self.resolver.resolve(category, zone))
            else {
                continue;
            };

            for unit in item.units_mut() {
                let tax = round_minor(self.calculator.calculate(unit.total_minor(), rate)?)?;

                if tax != 0 {
                    unit.add_adjustment(tax_adjustment(tax, rate, currency));
                }
            }
        }

        Ok(())
    }
}

/// Taxes each shipment whose method has a tax category.
#[derive(Debug, Clone)]
pub struct OrderShipmentTaxesApplicator {
    resolver: Arc<TaxRateResolver>,
    calculator: Arc<dyn TaxCalculator>,
}

impl OrderShipmentTaxesApplicator {
    /// Create a shipment applicator.
    pub fn new(resolver: Arc<TaxRateResolver>, calculator: Arc<dyn TaxCalculator>) -> Self {
        Self {
            resolver,
            calculator,
        }
    }
}

impl OrderTaxesApplicator for OrderShipmentTaxesApplicator {
    fn apply(&self, order: &mut Order<'_>, zone: &str) -> Result<(), TaxationError> {
        let currency = order.currency();

        for shipment in order.shipments_mut() {
            let Some(rate) = shipment
                .tax_category()
                .and_then(|category| self.resolver.resolve(category, zone))
            else {
                continue;
            };

            let tax = round_minor(self.calculator.calculate(shipment.total_minor(), rate)?)?;

            if tax != 0 {
                trace!(method = shipment.method(), rate = %rate.code, tax, "taxing shipment");
                shipment.add_adjustment(tax_adjustment(tax, rate, currency));
            }
        }

        Ok(())
    }
}

fn tax_adjustment<'a>(amount: i64, rate: &TaxRate, currency: &'a Currency) -> Adjustment<'a> {
    Adjustment::new(
        AdjustmentKind::Tax,
        rate.label(),
        Money::from_minor(amount, currency),
        rate.included_in_price,
        AdjustmentOrigin::TaxRate {
            code: rate.code.clone(),
            name: rate.name.clone(),
            amount: rate.amount,
        },
    )
}
