//! Promotion Eligibility
//!
//! A promotion is eligible for an order when every checker in a
//! [`CompositePromotionEligibilityChecker`] agrees. Checkers run in order and
//! the first refusal ends the evaluation.

use std::{fmt::Debug, sync::Arc};

use tracing::trace;

use crate::{
    clock::{Clock, within_window},
    orders::Order,
    promotions::{
        EligibilityError, Promotion,
        coupons::{CompositePromotionCouponEligibilityChecker, PromotionCouponEligibilityChecker},
        history::OrderHistory,
        rules::RuleCheckerRegistry,
    },
};

/// Decides whether a promotion applies to an order.
pub trait PromotionEligibilityChecker: Debug + Send + Sync {
    /// Returns whether `promotion` is eligible for `subject`.
    ///
    /// # Errors
    ///
    /// Returns an [`EligibilityError`] if eligibility cannot be determined.
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        promotion: &Promotion,
    ) -> Result<bool, EligibilityError>;
}

/// Passes when every inner checker passes, stopping at the first that doesn't.
#[derive(Debug)]
pub struct CompositePromotionEligibilityChecker {
    checkers: Vec<Box<dyn PromotionEligibilityChecker>>,
}

impl CompositePromotionEligibilityChecker {
    /// Create a composite of `checkers`, evaluated in order.
    ///
    /// # Errors
    ///
    /// Returns [`EligibilityError::NoCheckers`] if `checkers` is empty.
    pub fn new(
        checkers: Vec<Box<dyn PromotionEligibilityChecker>>,
    ) -> Result<Self, EligibilityError> {
        if checkers.is_empty() {
            return Err(EligibilityError::NoCheckers);
        }

        Ok(Self { checkers })
    }

    /// The standard chain: archival, channel, dates, usage limit, coupon and
    /// rules, with every built-in rule checker registered.
    pub fn with_defaults(clock: Arc<dyn Clock>, history: Arc<dyn OrderHistory>) -> Self {
        Self::with_registry(
            Arc::clone(&clock),
            Arc::clone(&history),
            RuleCheckerRegistry::with_defaults(history),
        )
    }

    /// The standard chain using a caller-supplied rule registry.
    pub fn with_registry(
        clock: Arc<dyn Clock>,
        history: Arc<dyn OrderHistory>,
        registry: RuleCheckerRegistry,
    ) -> Self {
        let coupons =
            CompositePromotionCouponEligibilityChecker::with_defaults(Arc::clone(&clock), history);

        Self {
            checkers: vec![
                Box::new(PromotionArchivalEligibilityChecker),
                Box::new(PromotionChannelEligibilityChecker),
                Box::new(PromotionDurationEligibilityChecker::new(clock)),
                Box::new(PromotionUsageLimitEligibilityChecker),
                Box::new(PromotionSubjectCouponEligibilityChecker::new(Box::new(coupons))),
                Box::new(PromotionRulesEligibilityChecker::new(registry)),
            ],
        }
    }
}

impl PromotionEligibilityChecker for CompositePromotionEligibilityChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        promotion: &Promotion,
    ) -> Result<bool, EligibilityError> {
        for checker in &self.checkers {
            if !checker.is_eligible(subject, promotion)? {
                trace!(promotion = %promotion.code, ?checker, "promotion not eligible");
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Promotions are only eligible inside their date window.
#[derive(Debug, Clone)]
pub struct PromotionDurationEligibilityChecker {
    clock: Arc<dyn Clock>,
}

impl PromotionDurationEligibilityChecker {
    /// Create a checker reading the time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl PromotionEligibilityChecker for PromotionDurationEligibilityChecker {
    fn is_eligible(&self, _: &Order<'_>, promotion: &Promotion) -> Result<bool, EligibilityError> {
        Ok(within_window(self.clock.now(), promotion.starts_at, promotion.ends_at))
    }
}

/// Promotions that have reached their usage limit are not eligible.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionUsageLimitEligibilityChecker;

impl PromotionEligibilityChecker for PromotionUsageLimitEligibilityChecker {
    fn is_eligible(&self, _: &Order<'_>, promotion: &Promotion) -> Result<bool, EligibilityError> {
        Ok(promotion.usage_limit.is_none_or(|limit| promotion.used < limit))
    }
}

/// Archived promotions are never eligible.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionArchivalEligibilityChecker;

impl PromotionEligibilityChecker for PromotionArchivalEligibilityChecker {
    fn is_eligible(&self, _: &Order<'_>, promotion: &Promotion) -> Result<bool, EligibilityError> {
        Ok(promotion.archived_at.is_none())
    }
}

/// Promotions only apply in the channels they list.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionChannelEligibilityChecker;

impl PromotionEligibilityChecker for PromotionChannelEligibilityChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        promotion: &Promotion,
    ) -> Result<bool, EligibilityError> {
        Ok(promotion.has_channel(subject.channel()))
    }
}

/// Coupon-based promotions need a matching, usable coupon on the order.
#[derive(Debug)]
pub struct PromotionSubjectCouponEligibilityChecker {
    coupons: Box<dyn PromotionCouponEligibilityChecker>,
}

impl PromotionSubjectCouponEligibilityChecker {
    /// Create a checker validating coupons with `coupons`.
    pub fn new(coupons: Box<dyn PromotionCouponEligibilityChecker>) -> Self {
        Self { coupons }
    }
}

impl PromotionEligibilityChecker for PromotionSubjectCouponEligibilityChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        promotion: &Promotion,
    ) -> Result<bool, EligibilityError> {
        if !promotion.coupon_based {
            return Ok(true);
        }

        let Some(coupon) = subject.coupon_code().and_then(|code| promotion.coupon(code)) else {
            return Ok(false);
        };

        self.coupons.is_eligible(subject, promotion, coupon)
    }
}

/// Every rule of the promotion must pass.
#[derive(Debug)]
pub struct PromotionRulesEligibilityChecker {
    registry: RuleCheckerRegistry,
}

impl PromotionRulesEligibilityChecker {
    /// Create a checker evaluating rules with the checkers in `registry`.
    pub fn new(registry: RuleCheckerRegistry) -> Self {
        Self { registry }
    }
}

impl PromotionEligibilityChecker for PromotionRulesEligibilityChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        promotion: &Promotion,
    ) -> Result<bool, EligibilityError> {
        for rule in &promotion.rules {
            let checker = self.registry.get(rule.rule_type())?;

            if !checker.is_eligible(subject, rule)? {
                trace!(promotion = %promotion.code, rule = rule.rule_type(), "rule not satisfied");
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use jiff::Timestamp;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::{
        clock::FixedClock,
        promotions::{
            PromotionCoupon,
            history::{InMemoryOrderHistory, MockOrderHistory},
            rules::PromotionRule,
        },
    };

    use super::*;

    #[derive(Debug)]
    struct Spy {
        answer: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Spy {
        fn boxed(answer: bool, calls: &Arc<AtomicUsize>) -> Box<dyn PromotionEligibilityChecker> {
            Box::new(Self {
                answer,
                calls: Arc::clone(calls),
            })
        }
    }

    impl PromotionEligibilityChecker for Spy {
        fn is_eligible(&self, _: &Order<'_>, _: &Promotion) -> Result<bool, EligibilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl PromotionEligibilityChecker for Failing {
        fn is_eligible(&self, _: &Order<'_>, _: &Promotion) -> Result<bool, EligibilityError> {
            Err(EligibilityError::UnknownRuleType("broken".to_string()))
        }
    }

    fn clock() -> Result<Arc<dyn Clock>, jiff::Error> {
        Ok(Arc::new(FixedClock("2024-06-01T12:00:00Z".parse()?)))
    }

    #[test]
    fn composite_requires_checkers() {
        assert_eq!(
            CompositePromotionEligibilityChecker::new(Vec::new()).err(),
            Some(EligibilityError::NoCheckers)
        );
    }

    #[test]
    fn composite_passes_when_all_pass() -> TestResult {
        let calls = Arc::new(AtomicUsize::new(0));
        let checker = CompositePromotionEligibilityChecker::new(vec![
            Spy::boxed(true, &calls),
            Spy::boxed(true, &calls),
            Spy::boxed(true, &calls),
        ])?;

        let order = Order::new("1", "WEB", GBP);

        assert!(checker.is_eligible(&order, &Promotion::default())?);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        Ok(())
    }

    #[test]
    fn composite_stops_at_first_refusal() -> TestResult {
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));

        let checker = CompositePromotionEligibilityChecker::new(vec![
            Spy::boxed(true, &before),
            Spy::boxed(false, &before),
            Spy::boxed(true, &after),
        ])?;

        let order = Order::new("1", "WEB", GBP);

        assert!(!checker.is_eligible(&order, &Promotion::default())?);
        assert_eq!(before.load(Ordering::SeqCst), 2);
        assert_eq!(after.load(Ordering::SeqCst), 0);

        Ok(())
    }

    #[test]
    fn composite_propagates_errors() -> TestResult {
        let calls = Arc::new(AtomicUsize::new(0));
        let checker = CompositePromotionEligibilityChecker::new(vec![
            Box::new(Failing),
            Spy::boxed(true, &calls),
        ])?;

        let order = Order::new("1", "WEB", GBP);

        assert!(checker.is_eligible(&order, &Promotion::default()).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        Ok(())
    }

    #[test]
    fn duration_window_is_inclusive() -> TestResult {
        let checker = PromotionDurationEligibilityChecker::new(clock()?);
        let order = Order::new("1", "WEB", GBP);

        let mut promotion = Promotion::new("SUMMER", "Summer", &["WEB"]);
        promotion.starts_at = Some("2024-06-01T12:00:00Z".parse::<Timestamp>()?);
        promotion.ends_at = Some("2024-06-30T00:00:00Z".parse::<Timestamp>()?);

        assert!(checker.is_eligible(&order, &promotion)?);

        promotion.starts_at = Some("2024-06-02T00:00:00Z".parse::<Timestamp>()?);

        assert!(!checker.is_eligible(&order, &promotion)?);

        Ok(())
    }

    #[test]
    fn usage_limit_and_archival() -> TestResult {
        let order = Order::new("1", "WEB", GBP);
        let mut promotion = Promotion::new("SUMMER", "Summer", &["WEB"]);

        promotion.usage_limit = Some(10);
        promotion.used = 9;
        assert!(PromotionUsageLimitEligibilityChecker.is_eligible(&order, &promotion)?);

        promotion.used = 10;
        assert!(!PromotionUsageLimitEligibilityChecker.is_eligible(&order, &promotion)?);

        assert!(PromotionArchivalEligibilityChecker.is_eligible(&order, &promotion)?);
        promotion.archived_at = Some("2024-01-01T00:00:00Z".parse::<Timestamp>()?);
        assert!(!PromotionArchivalEligibilityChecker.is_eligible(&order, &promotion)?);

        Ok(())
    }

    #[test]
    fn coupon_based_promotions_need_their_coupon() -> TestResult {
        let history: Arc<dyn OrderHistory> = Arc::new(InMemoryOrderHistory::new());
        let checker = PromotionSubjectCouponEligibilityChecker::new(Box::new(
            CompositePromotionCouponEligibilityChecker::with_defaults(clock()?, history),
        ));

        let mut promotion = Promotion::new("SUMMER", "Summer", &["WEB"]);
        promotion.coupon_based = true;
        promotion.coupons.push(PromotionCoupon::new("SUN10"));

        let mut order = Order::new("1", "WEB", GBP);
        assert!(!checker.is_eligible(&order, &promotion)?);

        order.set_coupon_code("SUN20");
        assert!(!checker.is_eligible(&order, &promotion)?);

        order.set_coupon_code("SUN10");
        assert!(checker.is_eligible(&order, &promotion)?);

        promotion.coupon_based = false;
        assert!(checker.is_eligible(&Order::new("2", "WEB", GBP), &promotion)?);

        Ok(())
    }

    #[test]
    fn rules_checker_fails_on_unknown_rule_types() -> TestResult {
        let checker = PromotionRulesEligibilityChecker::new(RuleCheckerRegistry::new());
        let order = Order::new("1", "WEB", GBP);

        let mut promotion = Promotion::new("SUMMER", "Summer", &["WEB"]);
        assert!(checker.is_eligible(&order, &promotion)?);

        promotion.rules.push(PromotionRule::CartQuantity { count: 1 });

        assert_eq!(
            checker.is_eligible(&order, &promotion),
            Err(EligibilityError::UnknownRuleType("cart_quantity".to_string()))
        );

        Ok(())
    }

    #[test]
    fn rules_checker_stops_at_first_failing_rule() -> TestResult {
        let mut history = MockOrderHistory::new();
        history.expect_placed_orders().never();

        let registry = RuleCheckerRegistry::with_defaults(Arc::new(history));
        let checker = PromotionRulesEligibilityChecker::new(registry);
        let order = Order::new("1", "WEB", GBP);

        let mut promotion = Promotion::new("SUMMER", "Summer", &["WEB"]);
        promotion.rules.push(PromotionRule::CartQuantity { count: 1 });
        promotion.rules.push(PromotionRule::NthOrder { nth: 2 });

        assert!(!checker.is_eligible(&order, &promotion)?);

        Ok(())
    }

    #[test]
    fn default_chain_rejects_other_channels() -> TestResult {
        let checker = CompositePromotionEligibilityChecker::with_defaults(
            clock()?,
            Arc::new(InMemoryOrderHistory::new()),
        );

        let order = Order::new("1", "WEB", GBP);

        assert!(checker.is_eligible(&order, &Promotion::new("SUMMER", "Summer", &["WEB"]))?);
        assert!(!checker.is_eligible(&order, &Promotion::new("SUMMER", "Summer", &["POS"]))?);

        Ok(())
    }
}
