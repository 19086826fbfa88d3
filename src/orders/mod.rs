//! Orders

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::orders::{
    adjustments::{Adjustment, AdjustmentKind},
    items::OrderItem,
};

pub mod adjustments;
pub mod items;

/// Errors related to order construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// An item's currency differs from the order currency (index, item currency, order currency).
    #[error("Item {0} has currency {1}, but order has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),
}

/// A customer placing an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: Option<u64>,
    email: String,
    group: Option<String>,
}

impl Customer {
    /// A customer that has not been persisted yet.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            group: None,
        }
    }

    /// A known customer.
    pub fn with_id(id: u64, email: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            email: email.into(),
            group: None,
        }
    }

    /// Place the customer in a customer group.
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Identifier, absent for new customers.
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Email address
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Customer group code
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns whether the customer has never been persisted.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// A shipment of (part of) an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Shipment<'a> {
    method: String,
    tax_category: Option<String>,
    adjustments: Vec<Adjustment<'a>>,
}

impl<'a> Shipment<'a> {
    /// Create a shipment using the given shipping method.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            tax_category: None,
            adjustments: Vec::new(),
        }
    }

    /// Tax category of the shipping method.
    #[must_use]
    pub fn with_tax_category(mut self, tax_category: impl Into<String>) -> Self {
        self.tax_category = Some(tax_category.into());
        self
    }

    /// Shipping method code
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Tax category of the shipping method, if taxable.
    pub fn tax_category(&self) -> Option<&str> {
        self.tax_category.as_deref()
    }

    /// Adjustments on this shipment.
    pub fn adjustments(&self) -> &[Adjustment<'a>] {
        &self.adjustments
    }

    /// Attach an adjustment.
    pub fn add_adjustment(&mut self, adjustment: Adjustment<'a>) {
        self.adjustments.push(adjustment);
    }

    /// Remove every adjustment of the given kind.
    pub fn remove_adjustments(&mut self, kind: AdjustmentKind) {
        self.adjustments.retain(|adjustment| adjustment.kind() != kind);
    }

    /// Sum of non-neutral adjustments, in minor units.
    pub fn total_minor(&self) -> i64 {
        self.adjustments
            .iter()
            .map(Adjustment::effective_minor)
            .fold(0, i64::saturating_add)
    }
}

/// An order: the subject of taxation and promotions.
#[derive(Debug, Clone, PartialEq)]
pub struct Order<'a> {
    number: String,
    channel: String,
    currency: &'a Currency,
    customer: Option<Customer>,
    items: Vec<OrderItem<'a>>,
    shipments: Vec<Shipment<'a>>,
    adjustments: Vec<Adjustment<'a>>,
    coupon_code: Option<String>,
    shipping_country: Option<String>,
    tax_zone: Option<String>,
    promotions: SmallVec<[String; 2]>,
}

impl<'a> Order<'a> {
    /// Create an empty order in a channel.
    pub fn new(
        number: impl Into<String>,
        channel: impl Into<String>,
        currency: &'a Currency,
    ) -> Self {
        Self {
            number: number.into(),
            channel: channel.into(),
            currency,
            customer: None,
            items: Vec::new(),
            shipments: Vec::new(),
            adjustments: Vec::new(),
            coupon_code: None,
            shipping_country: None,
            tax_zone: None,
            promotions: SmallVec::new(),
        }
    }

    /// Add an item to the order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::CurrencyMismatch`] if the item is priced in another currency.
    pub fn add_item(&mut self, item: OrderItem<'a>) -> Result<(), OrderError> {
        let item_currency = item.unit_price().currency();

        if item_currency != self.currency {
            return Err(OrderError::CurrencyMismatch(
                self.items.len(),
                item_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        self.items.push(item);

        Ok(())
    }

    /// Add a shipment to the order.
    pub fn add_shipment(&mut self, shipment: Shipment<'a>) {
        self.shipments.push(shipment);
    }

    /// Set the customer.
    pub fn set_customer(&mut self, customer: Customer) {
        self.customer = Some(customer);
    }

    /// Set the promotion coupon code entered by the customer.
    pub fn set_coupon_code(&mut self, code: impl Into<String>) {
        self.coupon_code = Some(code.into());
    }

    /// Set the shipping address country code.
    pub fn set_shipping_country(&mut self, country: impl Into<String>) {
        self.shipping_country = Some(country.into());
    }

    /// Set the tax zone the order falls in.
    pub fn set_tax_zone(&mut self, zone: impl Into<String>) {
        self.tax_zone = Some(zone.into());
    }

    /// Order number
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Channel code
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Order currency
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Customer, if known.
    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    /// Items
    pub fn items(&self) -> &[OrderItem<'a>] {
        &self.items
    }

    /// Items, mutably.
    pub fn items_mut(&mut self) -> &mut [OrderItem<'a>] {
        &mut self.items
    }

    /// Shipments
    pub fn shipments(&self) -> &[Shipment<'a>] {
        &self.shipments
    }

    /// Shipments, mutably.
    pub fn shipments_mut(&mut self) -> &mut [Shipment<'a>] {
        &mut self.shipments
    }

    /// Order-level adjustments.
    pub fn adjustments(&self) -> &[Adjustment<'a>] {
        &self.adjustments
    }

    /// Attach an order-level adjustment.
    pub fn add_adjustment(&mut self, adjustment: Adjustment<'a>) {
        self.adjustments.push(adjustment);
    }

    /// Coupon code entered for this order.
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    /// Shipping address country code.
    pub fn shipping_country(&self) -> Option<&str> {
        self.shipping_country.as_deref()
    }

    /// Tax zone of the order's address.
    pub fn tax_zone(&self) -> Option<&str> {
        self.tax_zone.as_deref()
    }

    /// Returns whether the order has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Codes of the promotions applied to this order.
    pub fn promotions(&self) -> &[String] {
        &self.promotions
    }

    /// Record a promotion as applied.
    pub fn add_promotion(&mut self, code: &str) {
        if !self.has_promotion(code) {
            self.promotions.push(code.to_string());
        }
    }

    /// Returns whether a promotion has been applied.
    pub fn has_promotion(&self, code: &str) -> bool {
        self.promotions.iter().any(|promotion| promotion == code)
    }

    /// Forget all applied promotions.
    pub fn clear_promotions(&mut self) {
        self.promotions.clear();
    }

    /// Remove adjustments of a kind from the order, its items, units and shipments.
    pub fn remove_adjustments_recursively(&mut self, kind: AdjustmentKind) {
        self.adjustments.retain(|adjustment| adjustment.kind() != kind);

        for item in &mut self.items {
            item.remove_adjustments_recursively(kind);
        }

        for shipment in &mut self.shipments {
            shipment.remove_adjustments(kind);
        }
    }

    /// Sum of item totals, in minor units.
    pub fn items_total_minor(&self) -> i64 {
        self.items
            .iter()
            .map(OrderItem::total_minor)
            .fold(0, i64::saturating_add)
    }

    /// Sum of shipment totals, in minor units.
    pub fn shipping_total_minor(&self) -> i64 {
        self.shipments
            .iter()
            .map(Shipment::total_minor)
            .fold(0, i64::saturating_add)
    }

    /// Sum of non-neutral order-level adjustments, in minor units.
    pub fn adjustments_total_minor(&self) -> i64 {
        self.adjustments
            .iter()
            .map(Adjustment::effective_minor)
            .fold(0, i64::saturating_add)
    }

    /// Every adjustment of a kind on the order, items, units and shipments, in minor units.
    ///
    /// Neutral adjustments are included so included taxes can be reported.
    pub fn adjustments_total_recursively(&self, kind: AdjustmentKind) -> i64 {
        let order = self
            .adjustments
            .iter()
            .chain(self.items.iter().flat_map(OrderItem::adjustments))
            .chain(self.shipments.iter().flat_map(Shipment::adjustments))
            .filter(|adjustment| adjustment.kind() == kind)
            .map(|adjustment| adjustment.amount().to_minor_units())
            .fold(0, i64::saturating_add);

        self.items
            .iter()
            .flat_map(OrderItem::units)
            .map(|unit| unit.adjustments_total_of(kind))
            .fold(order, i64::saturating_add)
    }

    /// Grand total in minor units.
    pub fn total_minor(&self) -> i64 {
        self.items_total_minor()
            .saturating_add(self.shipping_total_minor())
            .saturating_add(self.adjustments_total_minor())
    }

    /// Grand total
    pub fn total(&self) -> Money<'a, Currency> {
        Money::from_minor(self.total_minor(), self.currency)
    }

    /// Amount promotions are calculated against: the items total.
    pub fn promotion_subject_total(&self) -> i64 {
        self.items_total_minor()
    }

    /// Number of units promotions are calculated against.
    pub fn promotion_subject_count(&self) -> usize {
        self.items.iter().map(OrderItem::quantity).sum()
    }
}
