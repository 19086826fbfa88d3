//! Adjustments

use std::fmt;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

/// What kind of monetary delta an adjustment records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustmentKind {
    /// Tax charged on a unit or shipment.
    Tax,

    /// Shipping charge on a shipment.
    Shipping,

    /// Share of an order-level promotion discount.
    OrderPromotion,

    /// Promotion discount applied to a whole item.
    OrderItemPromotion,

    /// Promotion discount applied to a single unit.
    OrderUnitPromotion,

    /// Promotion discount applied to a shipment.
    OrderShippingPromotion,
}

impl AdjustmentKind {
    /// Returns whether this kind originates from a promotion.
    pub fn is_promotion(self) -> bool {
        matches!(
            self,
            Self::OrderPromotion
                | Self::OrderItemPromotion
                | Self::OrderUnitPromotion
                | Self::OrderShippingPromotion
        )
    }
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tax => "tax",
            Self::Shipping => "shipping",
            Self::OrderPromotion => "order_promotion",
            Self::OrderItemPromotion => "order_item_promotion",
            Self::OrderUnitPromotion => "order_unit_promotion",
            Self::OrderShippingPromotion => "order_shipping_promotion",
        };

        f.write_str(name)
    }
}

/// Where an adjustment came from.
#[derive(Debug, Clone, PartialEq)]
pub enum AdjustmentOrigin {
    /// Created by hand (e.g. a shipping charge).
    Manual,

    /// Created by a tax rate.
    TaxRate {
        /// Tax rate code
        code: String,

        /// Tax rate name
        name: String,

        /// Fractional rate amount
        amount: Decimal,
    },

    /// Created by a promotion.
    Promotion {
        /// Promotion code
        code: String,
    },
}

/// An immutable monetary delta attached to an order, item, unit or shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment<'a> {
    kind: AdjustmentKind,
    label: String,
    amount: Money<'a, Currency>,
    neutral: bool,
    origin: AdjustmentOrigin,
}

impl<'a> Adjustment<'a> {
    /// Create a new adjustment.
    pub fn new(
        kind: AdjustmentKind,
        label: impl Into<String>,
        amount: Money<'a, Currency>,
        neutral: bool,
        origin: AdjustmentOrigin,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            amount,
            neutral,
            origin,
        }
    }

    /// Adjustment kind
    pub fn kind(&self) -> AdjustmentKind {
        self.kind
    }

    /// Human readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Signed amount
    pub fn amount(&self) -> &Money<'a, Currency> {
        &self.amount
    }

    /// Neutral adjustments are informational and do not change totals.
    pub fn is_neutral(&self) -> bool {
        self.neutral
    }

    /// Audit trail for the adjustment.
    pub fn origin(&self) -> &AdjustmentOrigin {
        &self.origin
    }

    /// Amount that counts towards totals, in minor units.
    pub fn effective_minor(&self) -> i64 {
        if self.neutral {
            0
        } else {
            self.amount.to_minor_units()
        }
    }
}
