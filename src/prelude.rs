//! Trellis prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{
        Product, ProductVariant,
        taxons::{TaxonError, TaxonTree},
    },
    catalog_promotions::{
        CatalogPromotion, CatalogPromotionAction, CatalogPromotionError, ChannelPricing,
        applicator::CatalogPromotionApplicator,
        scopes::{CatalogPromotionScope, ScopeCheckerRegistry, ScopeError, VariantInScopeChecker},
    },
    checkout::{CheckoutError, price_order},
    clock::{Clock, FixedClock, SystemClock},
    config::{ConfigError, Settings},
    distribution::{DistributionError, IntegerDistributor, ProportionalIntegerDistributor},
    orders::{
        Customer, Order, OrderError, Shipment,
        adjustments::{Adjustment, AdjustmentKind, AdjustmentOrigin},
        items::{OrderItem, OrderItemUnit},
    },
    pricing::PricingError,
    promotions::{
        EligibilityError, Promotion, PromotionActionError, PromotionCoupon, PromotionError,
        actions::PromotionAction,
        coupons::{CompositePromotionCouponEligibilityChecker, PromotionCouponEligibilityChecker},
        eligibility::{CompositePromotionEligibilityChecker, PromotionEligibilityChecker},
        history::{InMemoryOrderHistory, OrderHistory},
        processor::PromotionProcessor,
        rules::{PromotionRule, RuleChecker, RuleCheckerRegistry},
    },
    taxation::{
        TaxationError,
        processor::{OrderTaxesProcessor, TaxCalculationStrategy},
        rates::{TaxRate, TaxRateResolver},
    },
};
