//! Report
//!
//! Renders a processed order as a table of items and shipments followed by
//! its totals.

use std::io;

use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::orders::{
    Order, Shipment,
    adjustments::{Adjustment, AdjustmentKind},
    items::OrderItem,
};

const PROMOTION_KINDS: [AdjustmentKind; 4] = [
    AdjustmentKind::OrderPromotion,
    AdjustmentKind::OrderItemPromotion,
    AdjustmentKind::OrderUnitPromotion,
    AdjustmentKind::OrderShippingPromotion,
];

/// Errors that can occur when writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report could not be written.
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Write the order table and totals to `out`.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if writing fails.
pub fn write_order(out: &mut impl io::Write, order: &Order<'_>) -> Result<(), ReportError> {
    let currency = order.currency();
    let mut builder = Builder::default();

    builder.push_record(["#", "Line", "Qty", "Unit price", "Promotions", "Tax", "Total"]);

    for (idx, item) in order.items().iter().enumerate() {
        builder.push_record([
            format!("#{:<3}", idx + 1),
            item.variant().name().to_string(),
            item.quantity().to_string(),
            item.unit_price().to_string(),
            money(item_total_of(item, &PROMOTION_KINDS), currency),
            money(item_total_of(item, &[AdjustmentKind::Tax]), currency),
            item.total().to_string(),
        ]);
    }

    for shipment in order.shipments() {
        builder.push_record([
            String::new(),
            shipment.method().to_string(),
            String::new(),
            money(shipment_total_of(shipment, &[AdjustmentKind::Shipping]), currency),
            money(shipment_total_of(shipment, &PROMOTION_KINDS), currency),
            money(shipment_total_of(shipment, &[AdjustmentKind::Tax]), currency),
            money(shipment.total_minor(), currency),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..7), Alignment::right());

    writeln!(out, "\n{table}")?;

    let promotions: i64 = PROMOTION_KINDS
        .iter()
        .map(|kind| order.adjustments_total_recursively(*kind))
        .sum();

    writeln!(out, " Items:      {}", money(order.items_total_minor(), currency))?;
    writeln!(out, " Shipping:   {}", money(order.shipping_total_minor(), currency))?;
    writeln!(out, " Promotions: {}", money(promotions, currency))?;
    writeln!(
        out,
        " Tax:        {}",
        money(order.adjustments_total_recursively(AdjustmentKind::Tax), currency)
    )?;
    writeln!(out, " \x1b[1mTotal:      {}\x1b[0m", order.total())?;

    if !order.promotions().is_empty() {
        writeln!(out, " Applied:    {}", order.promotions().join(", "))?;
    }

    writeln!(out)?;

    Ok(())
}

fn money(minor: i64, currency: &Currency) -> String {
    Money::from_minor(minor, currency).to_string()
}

/// Sum of item and unit adjustments of the given kinds, neutral ones included.
fn item_total_of(item: &OrderItem<'_>, kinds: &[AdjustmentKind]) -> i64 {
    let units: i64 = item
        .units()
        .iter()
        .flat_map(|unit| kinds.iter().map(|kind| unit.adjustments_total_of(*kind)))
        .sum();

    sum_of(item.adjustments(), kinds).saturating_add(units)
}

fn shipment_total_of(shipment: &Shipment<'_>, kinds: &[AdjustmentKind]) -> i64 {
    sum_of(shipment.adjustments(), kinds)
}

fn sum_of(adjustments: &[Adjustment<'_>], kinds: &[AdjustmentKind]) -> i64 {
    adjustments
        .iter()
        .filter(|adjustment| kinds.contains(&adjustment.kind()))
        .map(|adjustment| adjustment.amount().to_minor_units())
        .sum()
}
