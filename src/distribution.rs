//! Distribution
//!
//! Splitting integer amounts (minor units) across buckets without losing or
//! inventing a single unit of currency.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use thiserror::Error;

/// Errors that can occur while distributing an amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DistributionError {
    /// A non-zero amount cannot be split across zero buckets.
    #[error("cannot distribute {0} across zero targets")]
    NoTargets(i64),

    /// The weights add up to zero, so no proportion can be derived.
    #[error("cannot distribute {0} proportionally when the weights sum to zero")]
    ZeroTotalWeight(i64),

    /// An intermediate value did not fit in the supported integer range.
    #[error("distribution overflowed")]
    Overflow,
}

/// Splits an amount across weighted buckets, proportionally to each weight.
///
/// Each share is `weight * amount / Σ weights` rounded half toward zero. Any
/// units lost to rounding are handed out one at a time to the earliest
/// buckets with a non-zero weight, so the shares always add up to exactly
/// `amount` and zero-weight buckets always receive zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProportionalIntegerDistributor;

impl ProportionalIntegerDistributor {
    /// Distribute `amount` across `weights`.
    ///
    /// # Errors
    ///
    /// - [`DistributionError::NoTargets`]: `weights` is empty and `amount` is not zero.
    /// - [`DistributionError::ZeroTotalWeight`]: the weights sum to zero and `amount` is not zero.
    /// - [`DistributionError::Overflow`]: an intermediate value overflowed.
    pub fn distribute(&self, weights: &[i64], amount: i64) -> Result<Vec<i64>, DistributionError> {
        if amount == 0 {
            return Ok(vec![0; weights.len()]);
        }

        if weights.is_empty() {
            return Err(DistributionError::NoTargets(amount));
        }

        let total = weights
            .iter()
            .try_fold(0_i64, |acc, weight| acc.checked_add(*weight))
            .ok_or(DistributionError::Overflow)?;

        if total == 0 {
            return Err(DistributionError::ZeroTotalWeight(amount));
        }

        let total = Decimal::from(total);
        let target = Decimal::from(amount);

        let mut shares = weights
            .iter()
            .map(|weight| {
                Decimal::from(*weight)
                    .checked_mul(target)
                    .and_then(|scaled| scaled.checked_div(total))
                    .map(|exact| {
                        exact.round_dp_with_strategy(0, RoundingStrategy::MidpointTowardZero)
                    })
                    .and_then(|rounded| rounded.to_i64())
                    .ok_or(DistributionError::Overflow)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let distributed = shares
            .iter()
            .try_fold(0_i64, |acc, share| acc.checked_add(*share))
            .ok_or(DistributionError::Overflow)?;

        let missing = amount
            .checked_sub(distributed)
            .ok_or(DistributionError::Overflow)?;

        let step = missing.signum();
        let count = usize::try_from(missing.unsigned_abs())
            .map_err(|_err| DistributionError::Overflow)?;

        // Zero-weight buckets take no part in the correction.
        let weighted = shares
            .iter_mut()
            .zip(weights)
            .filter(|(_, weight)| **weight != 0)
            .map(|(share, _)| share);

        for share in weighted.take(count) {
            *share = share.checked_add(step).ok_or(DistributionError::Overflow)?;
        }

        Ok(shares)
    }
}

/// Splits an amount evenly across a number of targets.
///
/// The first `|amount| % targets` targets receive one extra unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerDistributor;

impl IntegerDistributor {
    /// Distribute `amount` evenly across `targets` buckets.
    ///
    /// # Errors
    ///
    /// - [`DistributionError::NoTargets`]: `targets` is zero.
    /// - [`DistributionError::Overflow`]: `targets` does not fit the amount's integer range.
    pub fn distribute(&self, amount: i64, targets: usize) -> Result<Vec<i64>, DistributionError> {
        if targets == 0 {
            return Err(DistributionError::NoTargets(amount));
        }

        let sign = if amount < 0 { -1 } else { 1 };
        let magnitude = amount.unsigned_abs();
        let divisor = u64::try_from(targets).map_err(|_err| DistributionError::Overflow)?;

        let low = magnitude / divisor;
        let remainder =
            usize::try_from(magnitude % divisor).map_err(|_err| DistributionError::Overflow)?;

        let low = i64::try_from(low).map_err(|_err| DistributionError::Overflow)?;
        let high = low.checked_add(1).ok_or(DistributionError::Overflow)?;

        Ok((0..targets)
            .map(|index| if index < remainder { high * sign } else { low * sign })
            .collect())
    }
}
