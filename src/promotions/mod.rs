//! Promotions
//!
//! Cart promotions: who is eligible ([`eligibility`], [`coupons`], [`rules`])
//! and what they receive ([`actions`], [`processor`]).

use jiff::Timestamp;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    distribution::DistributionError,
    pricing::PricingError,
    promotions::{actions::PromotionAction, rules::PromotionRule},
};

pub mod actions;
pub mod coupons;
pub mod eligibility;
pub mod history;
pub mod processor;
pub mod rules;

/// Errors raised while checking promotion eligibility.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EligibilityError {
    /// A composite checker was built without any checkers.
    #[error("composite eligibility checker needs at least one checker")]
    NoCheckers,

    /// No rule checker is registered for a rule type.
    #[error("no rule checker registered for rule type {0}")]
    UnknownRuleType(String),

    /// A rule checker was handed a rule it does not understand.
    #[error("rule checker {checker} cannot evaluate a {rule} rule")]
    UnsupportedRule {
        /// Rule type the checker is registered for
        checker: &'static str,

        /// Rule type it was handed
        rule: String,
    },
}

/// Errors raised while applying promotion actions.
#[derive(Debug, Error, PartialEq)]
pub enum PromotionActionError {
    /// Discount could not be split across items or units.
    #[error(transparent)]
    Distribution(#[from] DistributionError),

    /// Discount arithmetic failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Errors raised while processing promotions for an order.
#[derive(Debug, Error, PartialEq)]
pub enum PromotionError {
    /// Eligibility could not be determined.
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),

    /// An action could not be applied.
    #[error(transparent)]
    Action(#[from] PromotionActionError),
}

/// A coupon unlocking a coupon-based promotion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromotionCoupon {
    /// Coupon code
    pub code: String,

    /// Maximum number of uses across all customers.
    pub usage_limit: Option<u32>,

    /// Number of times the coupon has been used.
    pub used: u32,

    /// Maximum number of uses per customer.
    pub per_customer_usage_limit: Option<u32>,

    /// Instant after which the coupon is no longer valid.
    pub expires_at: Option<Timestamp>,
}

impl PromotionCoupon {
    /// An unlimited coupon.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }
}

/// A cart promotion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Promotion {
    /// Promotion code
    pub code: String,

    /// Promotion name
    pub name: String,

    /// Channels the promotion runs in.
    pub channels: SmallVec<[String; 2]>,

    /// Start of the promotion, if scheduled.
    pub starts_at: Option<Timestamp>,

    /// End of the promotion, if scheduled.
    pub ends_at: Option<Timestamp>,

    /// Maximum number of uses.
    pub usage_limit: Option<u32>,

    /// Number of times the promotion has been used.
    pub used: u32,

    /// Whether a coupon is needed to unlock the promotion.
    pub coupon_based: bool,

    /// Exclusive promotions are applied alone.
    pub exclusive: bool,

    /// Higher priorities are considered first.
    pub priority: i32,

    /// When the promotion was archived, if it was.
    pub archived_at: Option<Timestamp>,

    /// Rules that must all pass.
    pub rules: Vec<PromotionRule>,

    /// What the promotion grants.
    pub actions: Vec<PromotionAction>,

    /// Coupons for coupon-based promotions.
    pub coupons: Vec<PromotionCoupon>,
}

impl Promotion {
    /// Create an always-on promotion in the given channels.
    pub fn new(code: impl Into<String>, name: impl Into<String>, channels: &[&str]) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            channels: channels.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    /// Returns whether the promotion runs in a channel.
    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|code| code == channel)
    }

    /// Find one of this promotion's coupons by code.
    pub fn coupon(&self, code: &str) -> Option<&PromotionCoupon> {
        self.coupons.iter().find(|coupon| coupon.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_channels_and_coupons() {
        let mut promotion = Promotion::new("SUMMER", "Summer sale", &["WEB", "APP"]);
        promotion.coupons.push(PromotionCoupon::new("SUN10"));

        assert!(promotion.has_channel("APP"));
        assert!(!promotion.has_channel("POS"));
        assert!(promotion.coupon("SUN10").is_some());
        assert!(promotion.coupon("SUN20").is_none());
    }
}
