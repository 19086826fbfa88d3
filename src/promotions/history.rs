//! Order History
//!
//! What a customer has ordered before, as needed by nth-order rules and
//! per-customer coupon limits.

use std::fmt::Debug;

use rustc_hash::FxHashMap;

use crate::orders::Customer;

/// Read access to a customer's past orders.
#[cfg_attr(test, mockall::automock)]
pub trait OrderHistory: Debug + Send + Sync {
    /// Number of orders the customer has placed (carts excluded).
    fn placed_orders(&self, customer: &Customer) -> u32;

    /// Number of placed orders in which the customer used a coupon.
    fn coupon_uses(&self, customer: &Customer, coupon: &str) -> u32;
}

/// An [`OrderHistory`] backed by in-memory counters, keyed by customer email.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderHistory {
    placed: FxHashMap<String, u32>,
    coupons: FxHashMap<(String, String), u32>,
}

impl InMemoryOrderHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a placed order, optionally with a coupon.
    pub fn record(&mut self, email: &str, coupon: Option<&str>) {
        let placed = self.placed.entry(email.to_string()).or_default();
        *placed = placed.saturating_add(1);

        if let Some(coupon) = coupon {
            let uses = self
                .coupons
                .entry((email.to_string(), coupon.to_string()))
                .or_default();
            *uses = uses.saturating_add(1);
        }
    }
}

impl OrderHistory for InMemoryOrderHistory {
    fn placed_orders(&self, customer: &Customer) -> u32 {
        self.placed.get(customer.email()).copied().unwrap_or_default()
    }

    fn coupon_uses(&self, customer: &Customer, coupon: &str) -> u32 {
        self.coupons
            .get(&(customer.email().to_string(), coupon.to_string()))
            .copied()
            .unwrap_or_default()
    }
}
