//! Pricing
//!
//! Minor-unit arithmetic shared by taxation and promotions.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money, MoneyError,
    iso::{self, Currency},
};
use thiserror::Error;

/// Errors that can occur during pricing arithmetic or parsing.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A percentage or rate calculation overflowed or could not be represented.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A summed amount overflowed.
    #[error("amount overflowed")]
    Overflow,

    /// A price string was not in the "AMOUNT CURRENCY" format.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// A rate or percentage string could not be parsed.
    #[error("invalid rate: {0}")]
    InvalidRate(String),

    /// The currency code is not an ISO currency.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Calculate `percent` of a minor unit amount, rounding half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    // decimal_percentage doesn't expose the underlying Decimal
    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Round a fractional minor unit amount to a whole number of minor units.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the value does not fit in an `i64`.
pub fn round_minor(amount: Decimal) -> Result<i64, PricingError> {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::Overflow)
}

/// Sum minor unit amounts, failing on overflow.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the sum overflows.
pub fn sum_minor(amounts: impl IntoIterator<Item = i64>) -> Result<i64, PricingError> {
    amounts
        .into_iter()
        .try_fold(0_i64, i64::checked_add)
        .ok_or(PricingError::Overflow)
}

/// Build a money value in the given currency.
pub fn money(minor: i64, currency: &Currency) -> Money<'_, Currency> {
    Money::from_minor(minor, currency)
}

/// Parse a price string (e.g. "2.99 GBP") into minor units and currency.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed, or if the currency code is not recognised.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), PricingError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(PricingError::InvalidPrice(s.to_string()));
    };

    let currency = parse_currency(code)?;

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| PricingError::InvalidPrice(s.to_string()))?;

    let scale = Decimal::from(10_i64.pow(currency.exponent));

    let minor_units = amount
        .checked_mul(scale)
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| PricingError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Look up an ISO currency by its alphabetic code.
///
/// # Errors
///
/// Returns [`PricingError::UnknownCurrency`] for unrecognised codes.
pub fn parse_currency(code: &str) -> Result<&'static Currency, PricingError> {
    iso::find(code).ok_or_else(|| PricingError::UnknownCurrency(code.to_string()))
}

/// Parse a rate string into a fraction.
///
/// Accepts percentage format ("23%" for 0.23) or decimal format ("0.23").
///
/// # Errors
///
/// Returns [`PricingError::InvalidRate`] if the string cannot be parsed.
pub fn parse_rate(s: &str) -> Result<Decimal, PricingError> {
    let trimmed = s.trim();

    if let Some(percent) = trimmed.strip_suffix('%') {
        percent
            .trim()
            .parse::<Decimal>()
            .ok()
            .and_then(|value| value.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(|| PricingError::InvalidRate(s.to_string()))
    } else {
        trimmed
            .parse::<Decimal>()
            .map_err(|_err| PricingError::InvalidRate(s.to_string()))
    }
}

/// Parse a percentage string ("15%" or "0.15") into a [`Percentage`].
///
/// # Errors
///
/// Returns [`PricingError::InvalidRate`] if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, PricingError> {
    parse_rate(s).map(Percentage::from)
}
