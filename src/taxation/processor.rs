//! Order Taxes Processor

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::{
    orders::{Order, adjustments::AdjustmentKind},
    taxation::{
        TaxationError,
        applicators::{
            OrderItemUnitsTaxesApplicator, OrderItemsTaxesApplicator, OrderShipmentTaxesApplicator,
            OrderTaxesApplicator,
        },
        calculators::{DelegatingCalculator, TaxCalculator},
        rates::TaxRateResolver,
    },
};

/// How item taxes are calculated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxCalculationStrategy {
    /// Tax each item's total and split it across the units.
    #[default]
    OrderItemsBased,

    /// Tax each unit on its own.
    OrderItemUnitsBased,
}

/// Clears and recalculates the taxes of an order.
#[derive(Debug)]
pub struct OrderTaxesProcessor {
    applicators: Vec<Box<dyn OrderTaxesApplicator>>,
    default_zone: Option<String>,
}

impl OrderTaxesProcessor {
    /// Build a processor for a strategy using the delegating calculator.
    pub fn new(
        strategy: TaxCalculationStrategy,
        resolver: Arc<TaxRateResolver>,
        default_zone: Option<String>,
    ) -> Self {
        Self::with_calculator(
            strategy,
            resolver,
            Arc::new(DelegatingCalculator::default()),
            default_zone,
        )
    }

    /// Build a processor for a strategy with a specific calculator.
    pub fn with_calculator(
        strategy: TaxCalculationStrategy,
        resolver: Arc<TaxRateResolver>,
        calculator: Arc<dyn TaxCalculator>,
        default_zone: Option<String>,
    ) -> Self {
        let items: Box<dyn OrderTaxesApplicator> = match strategy {
            TaxCalculationStrategy::OrderItemsBased => Box::new(OrderItemsTaxesApplicator::new(
                Arc::clone(&resolver),
                Arc::clone(&calculator),
            )),
            TaxCalculationStrategy::OrderItemUnitsBased => Box::new(
                OrderItemUnitsTaxesApplicator::new(Arc::clone(&resolver), Arc::clone(&calculator)),
            ),
        };

        let shipments: Box<dyn OrderTaxesApplicator> =
            Box::new(OrderShipmentTaxesApplicator::new(resolver, calculator));

        Self {
            applicators: vec![items, shipments],
            default_zone,
        }
    }

    /// Remove existing tax adjustments and apply taxes for the order's zone.
    ///
    /// The order's own tax zone wins over the default zone; with neither,
    /// the order is left untaxed.
    ///
    /// # Errors
    ///
    /// Returns a [`TaxationError`] if any applicator fails.
    #[tracing::instrument(skip_all, fields(order = order.number()))]
    pub fn process(&self, order: &mut Order<'_>) -> Result<(), TaxationError> {
        order.remove_adjustments_recursively(AdjustmentKind::Tax);

        if order.is_empty() {
            return Ok(());
        }

        let Some(zone) = order
            .tax_zone()
            .map(ToString::to_string)
            .or_else(|| self.default_zone.clone())
        else {
            debug!("no tax zone; skipping taxes");
            return Ok(());
        };

        for applicator in &self.applicators {
            applicator.apply(order, &zone)?;
        }

        debug!(
            %zone,
            tax = order.adjustments_total_recursively(AdjustmentKind::Tax),
            "applied taxes"
        );

        Ok(())
    }
}
