//! Promotion Settings

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use serde::Deserialize;

use crate::{
    catalog_promotions::{CatalogPromotion, CatalogPromotionAction, scopes::CatalogPromotionScope},
    config::{ConfigError, Settings, channel_amounts},
    pricing::parse_percentage,
    promotions::{Promotion, PromotionCoupon, actions::PromotionAction, rules::PromotionRule},
};

/// Cart promotion settings
#[derive(Debug, Deserialize)]
pub struct PromotionSettings {
    /// Promotion code
    pub code: String,

    /// Promotion name
    pub name: String,

    /// Channel codes
    #[serde(default)]
    pub channels: Vec<String>,

    /// Start of the promotion
    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    /// End of the promotion
    #[serde(default)]
    pub ends_at: Option<Timestamp>,

    /// Maximum number of uses
    #[serde(default)]
    pub usage_limit: Option<u32>,

    /// Number of uses so far
    #[serde(default)]
    pub used: u32,

    /// Whether a coupon is required
    #[serde(default)]
    pub coupon_based: bool,

    /// Whether the promotion is applied alone
    #[serde(default)]
    pub exclusive: bool,

    /// Priority, highest first
    #[serde(default)]
    pub priority: i32,

    /// When the promotion was archived
    #[serde(default)]
    pub archived_at: Option<Timestamp>,

    /// Rules
    #[serde(default)]
    pub rules: Vec<PromotionRule>,

    /// Actions
    #[serde(default)]
    pub actions: Vec<PromotionActionSettings>,

    /// Coupons
    #[serde(default)]
    pub coupons: Vec<CouponSettings>,
}

/// Coupon settings
#[derive(Debug, Deserialize)]
pub struct CouponSettings {
    /// Coupon code
    pub code: String,

    /// Maximum number of uses
    #[serde(default)]
    pub usage_limit: Option<u32>,

    /// Number of uses so far
    #[serde(default)]
    pub used: u32,

    /// Maximum number of uses per customer
    #[serde(default)]
    pub per_customer_usage_limit: Option<u32>,

    /// Expiry
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

/// Cart promotion action settings
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionActionSettings {
    /// Fixed amount off the order
    OrderFixedDiscount {
        /// Amount per channel, e.g. `WEB: "5.00 GBP"`
        amounts: FxHashMap<String, String>,
    },

    /// Percentage off the order
    OrderPercentageDiscount {
        /// Percentage, e.g. "10%"
        percentage: String,
    },

    /// Fixed amount off every unit
    UnitFixedDiscount {
        /// Amount per channel
        amounts: FxHashMap<String, String>,
    },

    /// Percentage off every unit
    UnitPercentageDiscount {
        /// Percentage
        percentage: String,
    },

    /// Percentage off shipping
    ShippingPercentageDiscount {
        /// Percentage
        percentage: String,
    },
}

impl PromotionActionSettings {
    fn try_into_action(&self, currency: &'static Currency) -> Result<PromotionAction, ConfigError> {
        Ok(match self {
            Self::OrderFixedDiscount { amounts } => PromotionAction::OrderFixedDiscount {
                amounts: channel_amounts(amounts, currency)?,
            },
            Self::OrderPercentageDiscount { percentage } => {
                PromotionAction::OrderPercentageDiscount {
                    percentage: parse_percentage(percentage)?,
                }
            }
            Self::UnitFixedDiscount { amounts } => PromotionAction::UnitFixedDiscount {
                amounts: channel_amounts(amounts, currency)?,
            },
            Self::UnitPercentageDiscount { percentage } => PromotionAction::UnitPercentageDiscount {
                percentage: parse_percentage(percentage)?,
            },
            Self::ShippingPercentageDiscount { percentage } => {
                PromotionAction::ShippingPercentageDiscount {
                    percentage: parse_percentage(percentage)?,
                }
            }
        })
    }
}

/// Catalog promotion settings
#[derive(Debug, Deserialize)]
pub struct CatalogPromotionSettings {
    /// Promotion code
    pub code: String,

    /// Promotion name
    pub name: String,

    /// Channel codes
    #[serde(default)]
    pub channels: Vec<String>,

    /// Scopes
    #[serde(default)]
    pub scopes: Vec<CatalogPromotionScope>,

    /// Actions
    #[serde(default)]
    pub actions: Vec<CatalogPromotionActionSettings>,

    /// Start of the promotion
    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    /// End of the promotion
    #[serde(default)]
    pub ends_at: Option<Timestamp>,

    /// Whether the promotion is enabled
    #[serde(default = "enabled")]
    pub enabled: bool,

    /// Whether the promotion is applied alone
    #[serde(default)]
    pub exclusive: bool,

    /// Priority, highest first
    #[serde(default)]
    pub priority: i32,
}

fn enabled() -> bool {
    true
}

/// Catalog promotion action settings
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogPromotionActionSettings {
    /// Percentage off the price
    PercentageDiscount {
        /// Percentage, e.g. "20%"
        percentage: String,
    },

    /// Fixed amount off the price
    FixedDiscount {
        /// Amount per channel, e.g. `WEB: "1.00 GBP"`
        amounts: FxHashMap<String, String>,
    },
}

impl CatalogPromotionActionSettings {
    fn try_into_action(
        &self,
        currency: &'static Currency,
    ) -> Result<CatalogPromotionAction, ConfigError> {
        Ok(match self {
            Self::PercentageDiscount { percentage } => CatalogPromotionAction::PercentageDiscount {
                percentage: parse_percentage(percentage)?,
            },
            Self::FixedDiscount { amounts } => CatalogPromotionAction::FixedDiscount {
                amounts: channel_amounts(amounts, currency)?,
            },
        })
    }
}

impl Settings {
    /// Build the cart promotions.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount or percentage cannot be parsed.
    pub fn promotions(&self) -> Result<Vec<Promotion>, ConfigError> {
        let currency = self.currency()?;

        self.promotions
            .iter()
            .map(|settings| {
                let actions = settings
                    .actions
                    .iter()
                    .map(|action| action.try_into_action(currency))
                    .collect::<Result<_, _>>()?;

                Ok(Promotion {
                    code: settings.code.clone(),
                    name: settings.name.clone(),
                    channels: settings.channels.iter().cloned().collect(),
                    starts_at: settings.starts_at,
                    ends_at: settings.ends_at,
                    usage_limit: settings.usage_limit,
                    used: settings.used,
                    coupon_based: settings.coupon_based,
                    exclusive: settings.exclusive,
                    priority: settings.priority,
                    archived_at: settings.archived_at,
                    rules: settings.rules.clone(),
                    actions,
                    coupons: settings.coupons.iter().map(PromotionCoupon::from).collect(),
                })
            })
            .collect()
    }

    /// Build the catalog promotions.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount or percentage cannot be parsed.
    pub fn catalog_promotions(&self) -> Result<Vec<CatalogPromotion>, ConfigError> {
        let currency = self.currency()?;

        self.catalog_promotions
            .iter()
            .map(|settings| {
                let actions = settings
                    .actions
                    .iter()
                    .map(|action| action.try_into_action(currency))
                    .collect::<Result<_, _>>()?;

                Ok(CatalogPromotion {
                    code: settings.code.clone(),
                    name: settings.name.clone(),
                    channels: settings.channels.iter().cloned().collect(),
                    scopes: settings.scopes.clone(),
                    actions,
                    starts_at: settings.starts_at,
                    ends_at: settings.ends_at,
                    enabled: settings.enabled,
                    exclusive: settings.exclusive,
                    priority: settings.priority,
                })
            })
            .collect()
    }
}

impl From<&CouponSettings> for PromotionCoupon {
    fn from(settings: &CouponSettings) -> Self {
        Self {
            code: settings.code.clone(),
            usage_limit: settings.usage_limit,
            used: settings.used,
            per_customer_usage_limit: settings.per_customer_usage_limit,
            expires_at: settings.expires_at,
        }
    }
}
