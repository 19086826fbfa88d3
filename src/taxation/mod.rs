//! Taxation
//!
//! Resolving tax rates, calculating tax and recording it as adjustments on
//! units and shipments.

use thiserror::Error;

use crate::{distribution::DistributionError, pricing::PricingError};

pub mod applicators;
pub mod calculators;
pub mod processor;
pub mod rates;

/// Errors raised while applying taxes.
#[derive(Debug, Error, PartialEq)]
pub enum TaxationError {
    /// An order item has no units to carry tax.
    #[error("order item {0} has no units")]
    EmptyItem(String),

    /// Tax could not be split across units.
    #[error(transparent)]
    Distribution(#[from] DistributionError),

    /// Tax arithmetic failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}
