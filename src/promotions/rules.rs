//! Promotion Rules
//!
//! Rules are configuration; checkers evaluate them. Checkers are looked up in
//! a [`RuleCheckerRegistry`] by rule type, so new rule types can be added
//! without touching the built-in ones.

use std::{fmt::Debug, sync::Arc};

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    orders::{Order, items::OrderItem},
    promotions::{EligibilityError, history::OrderHistory},
};

/// Rule type of [`PromotionRule::CartQuantity`].
pub const CART_QUANTITY: &str = "cart_quantity";

/// Rule type of [`PromotionRule::ItemTotal`].
pub const ITEM_TOTAL: &str = "item_total";

/// Rule type of [`PromotionRule::NthOrder`].
pub const NTH_ORDER: &str = "nth_order";

/// Rule type of [`PromotionRule::HasTaxon`].
pub const HAS_TAXON: &str = "has_taxon";

/// Rule type of [`PromotionRule::TotalOfItemsFromTaxon`].
pub const TOTAL_OF_ITEMS_FROM_TAXON: &str = "total_of_items_from_taxon";

/// Rule type of [`PromotionRule::ContainsProduct`].
pub const CONTAINS_PRODUCT: &str = "contains_product";

/// Rule type of [`PromotionRule::CustomerGroup`].
pub const CUSTOMER_GROUP: &str = "customer_group";

/// Rule type of [`PromotionRule::ShippingCountry`].
pub const SHIPPING_COUNTRY: &str = "shipping_country";

/// A configured promotion rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionRule {
    /// The order has at least `count` units.
    CartQuantity {
        /// Minimum number of units
        count: usize,
    },

    /// The items total reaches the amount configured for the order's channel.
    ItemTotal {
        /// Minimum items total per channel code, in minor units
        amounts: FxHashMap<String, i64>,
    },

    /// The order is the customer's nth.
    NthOrder {
        /// Which order (1 = first)
        nth: u32,
    },

    /// At least one item's product is in one of the taxons.
    HasTaxon {
        /// Taxon codes
        taxons: Vec<String>,
    },

    /// Items from a taxon add up to the amount configured for the order's channel.
    TotalOfItemsFromTaxon {
        /// Taxon code
        taxon: String,

        /// Minimum total per channel code, in minor units
        amounts: FxHashMap<String, i64>,
    },

    /// At least one item is of the product.
    ContainsProduct {
        /// Product code
        product_code: String,
    },

    /// The customer belongs to the group.
    CustomerGroup {
        /// Customer group code
        group_code: String,
    },

    /// The order ships to the country.
    ShippingCountry {
        /// Country code
        country_code: String,
    },

    /// A rule evaluated by a checker registered under `rule_type`.
    Custom {
        /// Registry key of the checker
        rule_type: String,

        /// Free-form configuration
        #[serde(default)]
        configuration: FxHashMap<String, String>,
    },
}

impl PromotionRule {
    /// Registry key for this rule.
    pub fn rule_type(&self) -> &str {
        match self {
            Self::CartQuantity { .. } => CART_QUANTITY,
            Self::ItemTotal { .. } => ITEM_TOTAL,
            Self::NthOrder { .. } => NTH_ORDER,
            Self::HasTaxon { .. } => HAS_TAXON,
            Self::TotalOfItemsFromTaxon { .. } => TOTAL_OF_ITEMS_FROM_TAXON,
            Self::ContainsProduct { .. } => CONTAINS_PRODUCT,
            Self::CustomerGroup { .. } => CUSTOMER_GROUP,
            Self::ShippingCountry { .. } => SHIPPING_COUNTRY,
            Self::Custom { rule_type, .. } => rule_type,
        }
    }

    fn unsupported(&self, checker: &'static str) -> EligibilityError {
        EligibilityError::UnsupportedRule {
            checker,
            rule: self.rule_type().to_string(),
        }
    }
}

/// Evaluates one type of promotion rule against an order.
pub trait RuleChecker: Debug + Send + Sync {
    /// Returns whether `subject` satisfies `rule`.
    ///
    /// # Errors
    ///
    /// Returns [`EligibilityError::UnsupportedRule`] if the rule is not of the
    /// type this checker evaluates.
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        rule: &PromotionRule,
    ) -> Result<bool, EligibilityError>;
}

/// Checks [`PromotionRule::CartQuantity`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CartQuantityRuleChecker;

impl RuleChecker for CartQuantityRuleChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        rule: &PromotionRule,
    ) -> Result<bool, EligibilityError> {
        let PromotionRule::CartQuantity { count } = rule else {
            return Err(rule.unsupported(CART_QUANTITY));
        };

        Ok(subject.promotion_subject_count() >= *count)
    }
}

/// Checks [`PromotionRule::ItemTotal`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemTotalRuleChecker;

impl RuleChecker for ItemTotalRuleChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        rule: &PromotionRule,
    ) -> Result<bool, EligibilityError> {
        let PromotionRule::ItemTotal { amounts } = rule else {
            return Err(rule.unsupported(ITEM_TOTAL));
        };

        Ok(amounts
            .get(subject.channel())
            .is_some_and(|amount| subject.promotion_subject_total() >= *amount))
    }
}

/// Checks [`PromotionRule::NthOrder`] against the customer's order history.
#[derive(Debug, Clone)]
pub struct NthOrderRuleChecker {
    history: Arc<dyn OrderHistory>,
}

impl NthOrderRuleChecker {
    /// Create a checker reading from `history`.
    pub fn new(history: Arc<dyn OrderHistory>) -> Self {
        Self { history }
    }
}

impl RuleChecker for NthOrderRuleChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        rule: &PromotionRule,
    ) -> Result<bool, EligibilityError> {
        let PromotionRule::NthOrder { nth } = rule else {
            return Err(rule.unsupported(NTH_ORDER));
        };

        if *nth < 1 {
            return Ok(false);
        }

        let Some(customer) = subject.customer() else {
            return Ok(false);
        };

        if customer.is_new() {
            return Ok(*nth == 1);
        }

        Ok(self.history.placed_orders(customer).checked_add(1) == Some(*nth))
    }
}

/// Checks [`PromotionRule::HasTaxon`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HasTaxonRuleChecker;

impl RuleChecker for HasTaxonRuleChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        rule: &PromotionRule,
    ) -> Result<bool, EligibilityError> {
        let PromotionRule::HasTaxon { taxons } = rule else {
            return Err(rule.unsupported(HAS_TAXON));
        };

        Ok(subject.items().iter().any(|item| {
            taxons
                .iter()
                .any(|taxon| item.variant().product().has_taxon(taxon))
        }))
    }
}

/// Checks [`PromotionRule::TotalOfItemsFromTaxon`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalOfItemsFromTaxonRuleChecker;

impl RuleChecker for TotalOfItemsFromTaxonRuleChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        rule: &PromotionRule,
    ) -> Result<bool, EligibilityError> {
        let PromotionRule::TotalOfItemsFromTaxon { taxon, amounts } = rule else {
            return Err(rule.unsupported(TOTAL_OF_ITEMS_FROM_TAXON));
        };

        let Some(amount) = amounts.get(subject.channel()) else {
            return Ok(false);
        };

        let total = subject
            .items()
            .iter()
            .filter(|item| item.variant().product().has_taxon(taxon))
            .map(OrderItem::total_minor)
            .fold(0_i64, i64::saturating_add);

        Ok(total >= *amount)
    }
}

/// Checks [`PromotionRule::ContainsProduct`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainsProductRuleChecker;

impl RuleChecker for ContainsProductRuleChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        rule: &PromotionRule,
    ) -> Result<bool, EligibilityError> {
        let PromotionRule::ContainsProduct { product_code } = rule else {
            return Err(rule.unsupported(CONTAINS_PRODUCT));
        };

        Ok(subject
            .items()
            .iter()
            .any(|item| item.variant().product().code() == product_code))
    }
}

/// Checks [`PromotionRule::CustomerGroup`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerGroupRuleChecker;

impl RuleChecker for CustomerGroupRuleChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        rule: &PromotionRule,
    ) -> Result<bool, EligibilityError> {
        let PromotionRule::CustomerGroup { group_code } = rule else {
            return Err(rule.unsupported(CUSTOMER_GROUP));
        };

        Ok(subject
            .customer()
            .and_then(|customer| customer.group())
            .is_some_and(|group| group == group_code))
    }
}

/// Checks [`PromotionRule::ShippingCountry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ShippingCountryRuleChecker;

impl RuleChecker for ShippingCountryRuleChecker {
    fn is_eligible(
        &self,
        subject: &Order<'_>,
        rule: &PromotionRule,
    ) -> Result<bool, EligibilityError> {
        let PromotionRule::ShippingCountry { country_code } = rule else {
            return Err(rule.unsupported(SHIPPING_COUNTRY));
        };

        Ok(subject.shipping_country() == Some(country_code.as_str()))
    }
}

/// Rule checkers keyed by rule type.
#[derive(Debug, Default)]
pub struct RuleCheckerRegistry {
    checkers: FxHashMap<String, Box<dyn RuleChecker>>,
}

impl RuleCheckerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in checker.
    pub fn with_defaults(history: Arc<dyn OrderHistory>) -> Self {
        let mut registry = Self::new();

        registry.register(CART_QUANTITY, Box::new(CartQuantityRuleChecker));
        registry.register(ITEM_TOTAL, Box::new(ItemTotalRuleChecker));
        registry.register(NTH_ORDER, Box::new(NthOrderRuleChecker::new(history)));
        registry.register(HAS_TAXON, Box::new(HasTaxonRuleChecker));
        registry.register(TOTAL_OF_ITEMS_FROM_TAXON, Box::new(TotalOfItemsFromTaxonRuleChecker));
        registry.register(CONTAINS_PRODUCT, Box::new(ContainsProductRuleChecker));
        registry.register(CUSTOMER_GROUP, Box::new(CustomerGroupRuleChecker));
        registry.register(SHIPPING_COUNTRY, Box::new(ShippingCountryRuleChecker));

        registry
    }

    /// Register (or replace) the checker for a rule type.
    pub fn register(&mut self, rule_type: impl Into<String>, checker: Box<dyn RuleChecker>) {
        self.checkers.insert(rule_type.into(), checker);
    }

    /// Look up the checker for a rule type.
    ///
    /// # Errors
    ///
    /// Returns [`EligibilityError::UnknownRuleType`] if nothing is registered.
    pub fn get(&self, rule_type: &str) -> Result<&dyn RuleChecker, EligibilityError> {
        self.checkers
            .get(rule_type)
            .map(AsRef::as_ref)
            .ok_or_else(|| EligibilityError::UnknownRuleType(rule_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rusty_money::{Money, iso::GBP};
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{
        catalog::{Product, ProductVariant},
        orders::Customer,
        promotions::history::MockOrderHistory,
    };

    use super::*;

    fn item(product: &str, taxon: &str, price: i64, quantity: usize) -> OrderItem<'static> {
        let variant = ProductVariant::new(
            product,
            product,
            Arc::new(Product::new(product, product, smallvec![taxon.to_string()])),
        );

        OrderItem::new(variant, Money::from_minor(price, GBP), quantity)
    }

    fn order() -> Result<Order<'static>, crate::orders::OrderError> {
        let mut order = Order::new("1", "WEB", GBP);

        order.add_item(item("MUG", "kitchen", 1000, 2))?;
        order.add_item(item("CAP", "clothing", 500, 1))?;

        Ok(order)
    }

    fn amounts(channel: &str, amount: i64) -> FxHashMap<String, i64> {
        let mut amounts = FxHashMap::default();
        amounts.insert(channel.to_string(), amount);
        amounts
    }

    fn history(placed: u32) -> Arc<dyn OrderHistory> {
        let mut history = MockOrderHistory::new();
        history.expect_placed_orders().return_const(placed);
        Arc::new(history)
    }

    #[test]
    fn cart_quantity_counts_units() -> TestResult {
        let order = order()?;

        let three = PromotionRule::CartQuantity { count: 3 };
        let four = PromotionRule::CartQuantity { count: 4 };

        assert!(CartQuantityRuleChecker.is_eligible(&order, &three)?);
        assert!(!CartQuantityRuleChecker.is_eligible(&order, &four)?);

        Ok(())
    }

    #[test]
    fn item_total_uses_channel_amount() -> TestResult {
        let order = order()?;

        let reached = PromotionRule::ItemTotal { amounts: amounts("WEB", 2500) };
        let missed = PromotionRule::ItemTotal { amounts: amounts("WEB", 2501) };
        let other_channel = PromotionRule::ItemTotal { amounts: amounts("POS", 1) };

        assert!(ItemTotalRuleChecker.is_eligible(&order, &reached)?);
        assert!(!ItemTotalRuleChecker.is_eligible(&order, &missed)?);
        assert!(!ItemTotalRuleChecker.is_eligible(&order, &other_channel)?);

        Ok(())
    }

    #[test]
    fn nth_order_counts_placed_orders() -> TestResult {
        let mut order = order()?;
        order.set_customer(Customer::with_id(1, "jo@example.com"));

        let checker = NthOrderRuleChecker::new(history(2));

        assert!(checker.is_eligible(&order, &PromotionRule::NthOrder { nth: 3 })?);
        assert!(!checker.is_eligible(&order, &PromotionRule::NthOrder { nth: 2 })?);
        assert!(!checker.is_eligible(&order, &PromotionRule::NthOrder { nth: 0 })?);

        Ok(())
    }

    #[test]
    fn nth_order_new_customers_only_match_first_order() -> TestResult {
        let mut order = order()?;
        order.set_customer(Customer::new("new@example.com"));

        let mut history = MockOrderHistory::new();
        history.expect_placed_orders().never();
        let checker = NthOrderRuleChecker::new(Arc::new(history));

        assert!(checker.is_eligible(&order, &PromotionRule::NthOrder { nth: 1 })?);
        assert!(!checker.is_eligible(&order, &PromotionRule::NthOrder { nth: 2 })?);

        Ok(())
    }

    #[test]
    fn nth_order_requires_a_customer() -> TestResult {
        let checker = NthOrderRuleChecker::new(history(0));

        assert!(!checker.is_eligible(&order()?, &PromotionRule::NthOrder { nth: 1 })?);

        Ok(())
    }

    #[test]
    fn taxon_rules_match_product_taxons() -> TestResult {
        let order = order()?;

        let has_taxon = PromotionRule::HasTaxon {
            taxons: vec!["garden".to_string(), "clothing".to_string()],
        };
        let missing_taxon = PromotionRule::HasTaxon {
            taxons: vec!["garden".to_string()],
        };

        assert!(HasTaxonRuleChecker.is_eligible(&order, &has_taxon)?);
        assert!(!HasTaxonRuleChecker.is_eligible(&order, &missing_taxon)?);

        let kitchen_total = PromotionRule::TotalOfItemsFromTaxon {
            taxon: "kitchen".to_string(),
            amounts: amounts("WEB", 2000),
        };
        let clothing_total = PromotionRule::TotalOfItemsFromTaxon {
            taxon: "clothing".to_string(),
            amounts: amounts("WEB", 2000),
        };

        assert!(TotalOfItemsFromTaxonRuleChecker.is_eligible(&order, &kitchen_total)?);
        assert!(!TotalOfItemsFromTaxonRuleChecker.is_eligible(&order, &clothing_total)?);

        Ok(())
    }

    #[test]
    fn product_customer_group_and_country_rules() -> TestResult {
        let mut order = order()?;

        let contains = PromotionRule::ContainsProduct { product_code: "CAP".to_string() };
        let group = PromotionRule::CustomerGroup { group_code: "vip".to_string() };
        let country = PromotionRule::ShippingCountry { country_code: "GB".to_string() };

        assert!(ContainsProductRuleChecker.is_eligible(&order, &contains)?);
        assert!(!CustomerGroupRuleChecker.is_eligible(&order, &group)?);
        assert!(!ShippingCountryRuleChecker.is_eligible(&order, &country)?);

        order.set_customer(Customer::with_id(1, "jo@example.com").in_group("vip"));
        order.set_shipping_country("GB");

        assert!(CustomerGroupRuleChecker.is_eligible(&order, &group)?);
        assert!(ShippingCountryRuleChecker.is_eligible(&order, &country)?);

        Ok(())
    }

    #[test]
    fn checkers_reject_foreign_rules() -> TestResult {
        let result =
            CartQuantityRuleChecker.is_eligible(&order()?, &PromotionRule::NthOrder { nth: 1 });

        assert_eq!(
            result,
            Err(EligibilityError::UnsupportedRule {
                checker: CART_QUANTITY,
                rule: NTH_ORDER.to_string(),
            })
        );

        Ok(())
    }

    #[test]
    fn registry_reports_unknown_rule_types() {
        let registry = RuleCheckerRegistry::with_defaults(history(0));

        assert!(registry.get(CART_QUANTITY).is_ok());
        assert_eq!(
            registry.get("weather").err(),
            Some(EligibilityError::UnknownRuleType("weather".to_string()))
        );
    }

    #[test]
    fn rules_deserialize_from_yaml() -> TestResult {
        let rules: Vec<PromotionRule> = serde_norway::from_str(
            r"
- type: cart_quantity
  count: 2
- type: item_total
  amounts:
    WEB: 5000
- type: custom
  rule_type: weather
",
        )?;

        assert_eq!(rules.first(), Some(&PromotionRule::CartQuantity { count: 2 }));
        assert_eq!(rules.get(1).map(PromotionRule::rule_type), Some(ITEM_TOTAL));
        assert_eq!(rules.get(2).map(PromotionRule::rule_type), Some("weather"));

        Ok(())
    }
}
