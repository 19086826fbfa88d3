//! Order Items

use rusty_money::{Money, iso::Currency};

use crate::{
    catalog::ProductVariant,
    orders::adjustments::{Adjustment, AdjustmentKind},
};

/// The smallest priced and taxed unit of an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemUnit<'a> {
    unit_price: Money<'a, Currency>,
    adjustments: Vec<Adjustment<'a>>,
}

impl<'a> OrderItemUnit<'a> {
    /// Create a unit with no adjustments.
    pub fn new(unit_price: Money<'a, Currency>) -> Self {
        Self {
            unit_price,
            adjustments: Vec::new(),
        }
    }

    /// Attach an adjustment to this unit.
    pub fn add_adjustment(&mut self, adjustment: Adjustment<'a>) {
        self.adjustments.push(adjustment);
    }

    /// Adjustments on this unit.
    pub fn adjustments(&self) -> &[Adjustment<'a>] {
        &self.adjustments
    }

    /// Remove every adjustment of the given kind.
    pub fn remove_adjustments(&mut self, kind: AdjustmentKind) {
        self.adjustments.retain(|adjustment| adjustment.kind() != kind);
    }

    /// Sum of adjustments of the given kind, in minor units, neutral ones included.
    pub fn adjustments_total_of(&self, kind: AdjustmentKind) -> i64 {
        self.adjustments
            .iter()
            .filter(|adjustment| adjustment.kind() == kind)
            .map(|adjustment| adjustment.amount().to_minor_units())
            .sum()
    }

    /// Unit price plus non-neutral adjustments, in minor units.
    pub fn total_minor(&self) -> i64 {
        self.adjustments
            .iter()
            .map(Adjustment::effective_minor)
            .fold(self.unit_price.to_minor_units(), i64::saturating_add)
    }

    /// Unit price plus non-neutral adjustments.
    pub fn total(&self) -> Money<'a, Currency> {
        Money::from_minor(self.total_minor(), self.unit_price.currency())
    }
}

/// A line of an order: a variant bought in some quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem<'a> {
    variant: ProductVariant,
    unit_price: Money<'a, Currency>,
    units: Vec<OrderItemUnit<'a>>,
    adjustments: Vec<Adjustment<'a>>,
}

impl<'a> OrderItem<'a> {
    /// Create an item with `quantity` units at `unit_price`.
    pub fn new(variant: ProductVariant, unit_price: Money<'a, Currency>, quantity: usize) -> Self {
        Self {
            variant,
            unit_price,
            units: (0..quantity).map(|_| OrderItemUnit::new(unit_price)).collect(),
            adjustments: Vec::new(),
        }
    }

    /// The variant this item refers to.
    pub fn variant(&self) -> &ProductVariant {
        &self.variant
    }

    /// Price of a single unit before adjustments.
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Number of units.
    pub fn quantity(&self) -> usize {
        self.units.len()
    }

    /// Units of this item.
    pub fn units(&self) -> &[OrderItemUnit<'a>] {
        &self.units
    }

    /// Units of this item, mutably.
    pub fn units_mut(&mut self) -> &mut [OrderItemUnit<'a>] {
        &mut self.units
    }

    /// Item-level adjustments.
    pub fn adjustments(&self) -> &[Adjustment<'a>] {
        &self.adjustments
    }

    /// Attach an item-level adjustment.
    pub fn add_adjustment(&mut self, adjustment: Adjustment<'a>) {
        self.adjustments.push(adjustment);
    }

    /// Remove adjustments of the given kind from the item and all of its units.
    pub fn remove_adjustments_recursively(&mut self, kind: AdjustmentKind) {
        self.adjustments.retain(|adjustment| adjustment.kind() != kind);

        for unit in &mut self.units {
            unit.remove_adjustments(kind);
        }
    }

    /// Totals of each unit, in minor units.
    pub fn unit_totals(&self) -> Vec<i64> {
        self.units.iter().map(OrderItemUnit::total_minor).collect()
    }

    /// Sum of unit totals plus non-neutral item adjustments, in minor units.
    pub fn total_minor(&self) -> i64 {
        let units = self
            .units
            .iter()
            .map(OrderItemUnit::total_minor)
            .fold(0, i64::saturating_add);

        self.adjustments
            .iter()
            .map(Adjustment::effective_minor)
            .fold(units, i64::saturating_add)
    }

    /// Sum of unit totals plus non-neutral item adjustments.
    pub fn total(&self) -> Money<'a, Currency> {
        Money::from_minor(self.total_minor(), self.unit_price.currency())
    }
}
