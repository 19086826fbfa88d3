//! Coupon Eligibility

use std::{fmt::Debug, sync::Arc};

use tracing::trace;

use crate::{
    clock::Clock,
    orders::Order,
    promotions::{EligibilityError, Promotion, PromotionCoupon, history::OrderHistory},
};

/// Decides whether a coupon may be used on an order.
pub trait PromotionCouponEligibilityChecker: Debug + Send + Sync {
    /// Returns whether `coupon` of `promotion` may be used on `subject`.
    ///
    /// # Errors
    ///
    /// Returns an [`EligibilityError`] if eligibility cannot be determined.
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        promotion: &Promotion,
        coupon: &PromotionCoupon,
    ) -> Result<bool, EligibilityError>;
}

/// Passes when every inner checker passes, stopping at the first that doesn't.
#[derive(Debug)]
pub struct CompositePromotionCouponEligibilityChecker {
    checkers: Vec<Box<dyn PromotionCouponEligibilityChecker>>,
}

impl CompositePromotionCouponEligibilityChecker {
    /// Create a composite of `checkers`, evaluated in order.
    ///
    /// # Errors
    ///
    /// Returns [`EligibilityError::NoCheckers`] if `checkers` is empty.
    pub fn new(
        checkers: Vec<Box<dyn PromotionCouponEligibilityChecker>>,
    ) -> Result<Self, EligibilityError> {
        if checkers.is_empty() {
            return Err(EligibilityError::NoCheckers);
        }

        Ok(Self { checkers })
    }

    /// The standard chain: expiration, usage limit, per-customer usage limit
    /// and channel.
    pub fn with_defaults(clock: Arc<dyn Clock>, history: Arc<dyn OrderHistory>) -> Self {
        Self {
            checkers: vec![
                Box::new(CouponExpirationEligibilityChecker::new(clock)),
                Box::new(CouponUsageLimitEligibilityChecker),
                Box::new(CouponPerCustomerUsageLimitEligibilityChecker::new(history)),
                Box::new(CouponChannelEligibilityChecker),
            ],
        }
    }
}

impl PromotionCouponEligibilityChecker for CompositePromotionCouponEligibilityChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        promotion: &Promotion,
        coupon: &PromotionCoupon,
    ) -> Result<bool, EligibilityError> {
        for checker in &self.checkers {
            if !checker.is_eligible(subject, promotion, coupon)? {
                trace!(coupon = %coupon.code, ?checker, "coupon not eligible");
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Expired coupons are not eligible.
#[derive(Debug, Clone)]
pub struct CouponExpirationEligibilityChecker {
    clock: Arc<dyn Clock>,
}

impl CouponExpirationEligibilityChecker {
    /// Create a checker reading the time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl PromotionCouponEligibilityChecker for CouponExpirationEligibilityChecker {
    fn is_eligible(
        &self,
        _: &Order<'_>,
        _: &Promotion,
        coupon: &PromotionCoupon,
    ) -> Result<bool, EligibilityError> {
        Ok(coupon
            .expires_at
            .is_none_or(|expires_at| self.clock.now() <= expires_at))
    }
}

/// Coupons that have reached their usage limit are not eligible.
#[derive(Debug, Clone, Copy, Default)]
pub struct CouponUsageLimitEligibilityChecker;

impl PromotionCouponEligibilityChecker for CouponUsageLimitEligibilityChecker {
    fn is_eligible(
        &self,
        _: &Order<'_>,
        _: &Promotion,
        coupon: &PromotionCoupon,
    ) -> Result<bool, EligibilityError> {
        Ok(coupon.usage_limit.is_none_or(|limit| coupon.used < limit))
    }
}

/// Limits how often one customer may use a coupon.
#[derive(Debug, Clone)]
pub struct CouponPerCustomerUsageLimitEligibilityChecker {
    history: Arc<dyn OrderHistory>,
}

impl CouponPerCustomerUsageLimitEligibilityChecker {
    /// Create a checker reading coupon uses from `history`.
    pub fn new(history: Arc<dyn OrderHistory>) -> Self {
        Self { history }
    }
}

impl PromotionCouponEligibilityChecker for CouponPerCustomerUsageLimitEligibilityChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        _: &Promotion,
        coupon: &PromotionCoupon,
    ) -> Result<bool, EligibilityError> {
        let Some(limit) = coupon.per_customer_usage_limit else {
            return Ok(true);
        };

        // Without a customer there is nothing to count uses against.
        let Some(customer) = subject.customer() else {
            return Ok(false);
        };

        Ok(self.history.coupon_uses(customer, &coupon.code) < limit)
    }
}

/// The coupon's promotion must run in the order's channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct CouponChannelEligibilityChecker;

impl PromotionCouponEligibilityChecker for CouponChannelEligibilityChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        promotion: &Promotion,
        _: &PromotionCoupon,
    ) -> Result<bool, EligibilityError> {
        Ok(promotion.has_channel(subject.channel()))
    }
}
