//! Distribution Tests

use proptest::prelude::*;
use testresult::TestResult;
use trellis::distribution::{DistributionError, IntegerDistributor, ProportionalIntegerDistributor};

#[test]
fn proportional_distribution_matches_known_splits() -> TestResult {
    let distributor = ProportionalIntegerDistributor;

    assert_eq!(distributor.distribute(&[100, 90], 191)?, vec![101, 90]);
    assert_eq!(distributor.distribute(&[1000, 1000, 1000], 100)?, vec![34, 33, 33]);
    assert_eq!(distributor.distribute(&[4300, 1400, 2000], -1200)?, vec![-670, -218, -312]);

    Ok(())
}

#[test]
fn proportional_distribution_gives_free_buckets_nothing() -> TestResult {
    assert_eq!(ProportionalIntegerDistributor.distribute(&[0, 100, 100], 101)?, vec![0, 51, 50]);

    Ok(())
}

#[test]
fn proportional_distribution_rejects_zero_weights() {
    assert_eq!(
        ProportionalIntegerDistributor.distribute(&[0, 0], 10),
        Err(DistributionError::ZeroTotalWeight(10))
    );
}

proptest! {
    #[test]
    fn proportional_shares_sum_to_amount(
        weights in prop::collection::vec(-1_000_000_i64..1_000_000, 1..20),
        amount in -10_000_000_i64..10_000_000,
    ) {
        prop_assume!(weights.iter().sum::<i64>() != 0);

        let shares = ProportionalIntegerDistributor.distribute(&weights, amount);

        prop_assert!(shares.is_ok());

        let shares = shares.unwrap_or_default();

        prop_assert_eq!(shares.len(), weights.len());
        prop_assert_eq!(shares.iter().sum::<i64>(), amount);
    }

    #[test]
    fn free_buckets_receive_nothing(
        weights in prop::collection::vec(prop_oneof![Just(0_i64), 1_i64..10_000], 2..20),
        amount in -1_000_000_i64..1_000_000,
    ) {
        prop_assume!(weights.iter().any(|weight| *weight != 0));

        let shares = ProportionalIntegerDistributor
            .distribute(&weights, amount)
            .unwrap_or_default();

        prop_assert_eq!(shares.iter().sum::<i64>(), amount);

        for (share, weight) in shares.iter().zip(&weights) {
            if *weight == 0 {
                prop_assert_eq!(*share, 0);
            }
        }
    }

    #[test]
    fn even_shares_sum_to_amount_and_differ_by_at_most_one(
        amount in -10_000_000_i64..10_000_000,
        targets in 1_usize..50,
    ) {
        let shares = IntegerDistributor.distribute(amount, targets).unwrap_or_default();

        prop_assert_eq!(shares.len(), targets);
        prop_assert_eq!(shares.iter().sum::<i64>(), amount);

        let max = shares.iter().max().copied().unwrap_or_default();
        let min = shares.iter().min().copied().unwrap_or_default();

        prop_assert!(max - min <= 1);
    }
}
