//! Catalog Promotions
//!
//! Catalog promotions lower a variant's channel price before it is added to a
//! cart, for every variant inside one of their [`scopes`].

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    catalog_promotions::scopes::{CatalogPromotionScope, ScopeError},
    pricing::{PricingError, percent_of_minor},
};

pub mod applicator;
pub mod scopes;

/// Errors raised while applying catalog promotions.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogPromotionError {
    /// Scope membership could not be decided.
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// Discount arithmetic failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// How a catalog promotion changes a price.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogPromotionAction {
    /// Take a percentage off the price.
    PercentageDiscount {
        /// Discount percentage
        percentage: Percentage,
    },

    /// Take a fixed amount off the price, per channel.
    FixedDiscount {
        /// Discount per channel code, in minor units
        amounts: FxHashMap<String, i64>,
    },
}

impl CatalogPromotionAction {
    /// The discounted price, before any minimum price is enforced.
    ///
    /// A fixed discount with no amount for `channel` leaves the price alone.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the discount cannot be calculated.
    pub fn discounted(&self, price: i64, channel: &str) -> Result<i64, PricingError> {
        match self {
            Self::PercentageDiscount { percentage } => price
                .checked_sub(percent_of_minor(percentage, price)?)
                .ok_or(PricingError::Overflow),
            Self::FixedDiscount { amounts } => match amounts.get(channel) {
                Some(amount) => price.checked_sub(*amount).ok_or(PricingError::Overflow),
                None => Ok(price),
            },
        }
    }
}

/// A promotion lowering catalog prices.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPromotion {
    /// Promotion code
    pub code: String,

    /// Promotion name
    pub name: String,

    /// Channels the promotion runs in.
    pub channels: SmallVec<[String; 2]>,

    /// Variants the promotion applies to.
    pub scopes: Vec<CatalogPromotionScope>,

    /// Price changes, applied in order.
    pub actions: Vec<CatalogPromotionAction>,

    /// Start of the promotion, if scheduled.
    pub starts_at: Option<Timestamp>,

    /// End of the promotion, if scheduled.
    pub ends_at: Option<Timestamp>,

    /// Disabled promotions are never applied.
    pub enabled: bool,

    /// Exclusive promotions are applied alone.
    pub exclusive: bool,

    /// Higher priorities are applied first.
    pub priority: i32,
}

impl CatalogPromotion {
    /// Create an enabled, unscheduled promotion in the given channels.
    pub fn new(code: impl Into<String>, name: impl Into<String>, channels: &[&str]) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            channels: channels.iter().map(ToString::to_string).collect(),
            scopes: Vec::new(),
            actions: Vec::new(),
            starts_at: None,
            ends_at: None,
            enabled: true,
            exclusive: false,
            priority: 0,
        }
    }

    /// Returns whether the promotion runs in a channel.
    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|code| code == channel)
    }
}

/// A variant's price in one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPricing<'a> {
    channel: String,
    price: Money<'a, Currency>,
    original_price: Option<Money<'a, Currency>>,
    minimum_price: Money<'a, Currency>,
    applied_promotions: SmallVec<[String; 2]>,
}

impl<'a> ChannelPricing<'a> {
    /// Create a pricing with no minimum price.
    pub fn new(channel: impl Into<String>, price: Money<'a, Currency>) -> Self {
        Self {
            channel: channel.into(),
            price,
            original_price: None,
            minimum_price: Money::from_minor(0, price.currency()),
            applied_promotions: SmallVec::new(),
        }
    }

    /// Set the lowest price promotions may bring this pricing to.
    #[must_use]
    pub fn with_minimum_price(mut self, minimum_price: Money<'a, Currency>) -> Self {
        self.minimum_price = minimum_price;
        self
    }

    /// Channel code
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Current price
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Price before catalog promotions, once one has been applied.
    pub fn original_price(&self) -> Option<&Money<'a, Currency>> {
        self.original_price.as_ref()
    }

    /// Lowest price promotions may reach.
    pub fn minimum_price(&self) -> &Money<'a, Currency> {
        &self.minimum_price
    }

    /// Codes of the catalog promotions applied to this pricing.
    pub fn applied_promotions(&self) -> &[String] {
        &self.applied_promotions
    }

    /// Undo every catalog promotion.
    pub fn reset(&mut self) {
        if let Some(original_price) = self.original_price.take() {
            self.price = original_price;
        }

        self.applied_promotions.clear();
    }

    /// Set a promoted price, never below the minimum price and never above
    /// the current price.
    ///
    /// Returns whether the price changed. Nothing is recorded when it didn't.
    fn apply(&mut self, promotion: &str, price: i64) -> bool {
        let current = self.price.to_minor_units();
        let price = price.max(self.minimum_price.to_minor_units()).min(current);

        if price == current {
            return false;
        }

        if self.original_price.is_none() {
            self.original_price = Some(self.price);
        }

        self.price = Money::from_minor(price, self.price.currency());

        if !self.applied_promotions.iter().any(|code| code == promotion) {
            self.applied_promotions.push(promotion.to_string());
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    fn amounts(channel: &str, amount: i64) -> FxHashMap<String, i64> {
        let mut amounts = FxHashMap::default();
        amounts.insert(channel.to_string(), amount);
        amounts
    }

    #[test]
    fn percentage_discount_rounds_the_discount() -> TestResult {
        let action = CatalogPromotionAction::PercentageDiscount {
            percentage: Percentage::from(0.5),
        };

        assert_eq!(action.discounted(999, "WEB")?, 499);

        Ok(())
    }

    #[test]
    fn fixed_discount_uses_channel_amount() -> TestResult {
        let action = CatalogPromotionAction::FixedDiscount {
            amounts: amounts("WEB", 300),
        };

        assert_eq!(action.discounted(1000, "WEB")?, 700);
        assert_eq!(action.discounted(1000, "POS")?, 1000);

        Ok(())
    }

    #[test]
    fn pricing_respects_minimum_and_resets() {
        let mut pricing = ChannelPricing::new("WEB", Money::from_minor(1000, GBP))
            .with_minimum_price(Money::from_minor(800, GBP));

        assert!(pricing.apply("SPRING", 500));

        assert_eq!(pricing.price(), &Money::from_minor(800, GBP));
        assert_eq!(pricing.original_price(), Some(&Money::from_minor(1000, GBP)));
        assert_eq!(pricing.applied_promotions(), ["SPRING".to_string()]);

        pricing.reset();

        assert_eq!(pricing.price(), &Money::from_minor(1000, GBP));
        assert_eq!(pricing.original_price(), None);
        assert!(pricing.applied_promotions().is_empty());
    }

    #[test]
    fn unchanged_prices_are_not_recorded() {
        let mut pricing = ChannelPricing::new("WEB", Money::from_minor(1000, GBP))
            .with_minimum_price(Money::from_minor(1000, GBP));

        assert!(!pricing.apply("AT_FLOOR", 700));
        assert!(!pricing.apply("NO_CHANGE", 1000));

        assert_eq!(pricing.price(), &Money::from_minor(1000, GBP));
        assert_eq!(pricing.original_price(), None);
        assert!(pricing.applied_promotions().is_empty());
    }

    #[test]
    fn promotions_never_raise_the_price() {
        let mut pricing = ChannelPricing::new("WEB", Money::from_minor(1000, GBP))
            .with_minimum_price(Money::from_minor(1200, GBP));

        assert!(!pricing.apply("SPRING", 900));
        assert_eq!(pricing.price(), &Money::from_minor(1000, GBP));
    }
}
