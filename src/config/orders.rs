//! Order Settings

use rusty_money::Money;
use serde::Deserialize;

use crate::{
    config::{ConfigError, Settings, catalog::Catalog, price_in},
    orders::{
        Customer, Order, Shipment,
        adjustments::{Adjustment, AdjustmentKind, AdjustmentOrigin},
        items::OrderItem,
    },
    promotions::history::InMemoryOrderHistory,
};

/// Order settings
#[derive(Debug, Deserialize)]
pub struct OrderSettings {
    /// Order number
    pub number: String,

    /// Customer
    #[serde(default)]
    pub customer: Option<CustomerSettings>,

    /// Coupon code entered at checkout
    #[serde(default)]
    pub coupon_code: Option<String>,

    /// Shipping address country
    #[serde(default)]
    pub shipping_country: Option<String>,

    /// Tax zone of the address
    #[serde(default)]
    pub tax_zone: Option<String>,

    /// Items
    #[serde(default)]
    pub items: Vec<OrderItemSettings>,

    /// Shipments
    #[serde(default)]
    pub shipments: Vec<ShipmentSettings>,
}

/// Customer settings
#[derive(Debug, Deserialize)]
pub struct CustomerSettings {
    /// Customer id; absent for new customers
    #[serde(default)]
    pub id: Option<u64>,

    /// Email address
    pub email: String,

    /// Customer group code
    #[serde(default)]
    pub group: Option<String>,
}

/// Order item settings
#[derive(Debug, Deserialize)]
pub struct OrderItemSettings {
    /// Variant code
    pub variant: String,

    /// Quantity
    pub quantity: usize,
}

/// Shipment settings
#[derive(Debug, Deserialize)]
pub struct ShipmentSettings {
    /// Shipping method code
    pub method: String,

    /// Shipping charge, e.g. "4.99 GBP"
    pub charge: String,

    /// Tax category of the shipping method
    #[serde(default)]
    pub tax_category: Option<String>,
}

/// A previously placed order
#[derive(Debug, Deserialize)]
pub struct HistorySettings {
    /// Customer email
    pub email: String,

    /// Coupon used, if any
    #[serde(default)]
    pub coupon: Option<String>,
}

impl From<&CustomerSettings> for Customer {
    fn from(settings: &CustomerSettings) -> Self {
        let customer = match settings.id {
            Some(id) => Customer::with_id(id, settings.email.clone()),
            None => Customer::new(settings.email.clone()),
        };

        match &settings.group {
            Some(group) => customer.in_group(group.clone()),
            None => customer,
        }
    }
}

impl Settings {
    /// Build the order history.
    pub fn order_history(&self) -> InMemoryOrderHistory {
        let mut history = InMemoryOrderHistory::new();

        for order in &self.history {
            history.record(&order.email, order.coupon.as_deref());
        }

        history
    }

    /// Build the order, pricing items at their current catalog prices.
    ///
    /// # Errors
    ///
    /// Returns an error if an item refers to an unknown variant or a
    /// shipping charge is invalid.
    pub fn order(&self, catalog: &Catalog) -> Result<Order<'static>, ConfigError> {
        let currency = self.currency()?;
        let settings = &self.order;
        let mut order = Order::new(settings.number.clone(), self.channel.clone(), currency);

        if let Some(customer) = &settings.customer {
            order.set_customer(customer.into());
        }

        if let Some(coupon_code) = &settings.coupon_code {
            order.set_coupon_code(coupon_code.clone());
        }

        if let Some(country) = &settings.shipping_country {
            order.set_shipping_country(country.clone());
        }

        if let Some(zone) = &settings.tax_zone {
            order.set_tax_zone(zone.clone());
        }

        for item in &settings.items {
            let entry = catalog
                .get(&item.variant)
                .ok_or_else(|| ConfigError::VariantNotFound(item.variant.clone()))?;

            order.add_item(OrderItem::new(
                entry.variant.clone(),
                *entry.pricing.price(),
                item.quantity,
            ))?;
        }

        for shipment_settings in &settings.shipments {
            let charge = price_in(&shipment_settings.charge, currency)?;
            let mut shipment = Shipment::new(shipment_settings.method.clone());

            if let Some(tax_category) = &shipment_settings.tax_category {
                shipment = shipment.with_tax_category(tax_category.clone());
            }

            shipment.add_adjustment(Adjustment::new(
                AdjustmentKind::Shipping,
                shipment_settings.method.clone(),
                Money::from_minor(charge, currency),
                false,
                AdjustmentOrigin::Manual,
            ));

            order.add_shipment(shipment);
        }

        Ok(order)
    }
}
