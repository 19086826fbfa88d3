//! Trellis
//!
//! Trellis prices storefront orders: it distributes taxes and discounts
//! across order units without losing a minor unit, decides which cart
//! promotions an order is eligible for, and applies catalog promotions to
//! the variants they cover.

pub mod catalog;
pub mod catalog_promotions;
pub mod checkout;
pub mod clock;
pub mod config;
pub mod distribution;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod promotions;
pub mod report;
pub mod taxation;
