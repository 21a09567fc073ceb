//! Property-based tests for the optica validation rules and money arithmetic.
//!
//! These use proptest to check the rules hold across the whole input range,
//! not just the handful of values the integration tests exercise.

use optica_api::entities::order;
use optica_api::services::pricing::{self, VoucherBalance};
use optica_api::validation::{
    validate_axis, validate_lens_power, validate_payment_amount,
    validate_phone_number, validate_price, validate_pupillary_distance, AXIS_MAX, AXIS_MIN,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn cents_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn lens_power_strategy() -> impl Strategy<Value = Decimal> {
    (-2_000i64..=2_000).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

proptest! {
    #[test]
    fn axis_accepts_exactly_zero_to_180(axis in -1_000i32..1_000) {
        let in_range = (AXIS_MIN..=AXIS_MAX).contains(&axis);
        prop_assert_eq!(validate_axis(axis).is_ok(), in_range);
    }

    #[test]
    fn lens_power_in_range_is_accepted(power in lens_power_strategy()) {
        prop_assert!(validate_lens_power(&power).is_ok());
    }

    #[test]
    fn lens_power_beyond_twenty_is_rejected(excess in 1i64..100_000, negative in any::<bool>()) {
        let magnitude = Decimal::new(2_000 + excess, 2);
        let power = if negative { -magnitude } else { magnitude };
        prop_assert!(validate_lens_power(&power).is_err());
    }

    #[test]
    fn lens_power_with_three_places_is_rejected(thousandths in -19_999i64..19_999) {
        prop_assume!(thousandths % 10 != 0);
        let power = Decimal::new(thousandths, 3);
        prop_assert!(validate_lens_power(&power).is_err());
    }

    #[test]
    fn pupillary_distance_tenths_between_50_and_70(tenths in 400i64..800) {
        let value = Decimal::new(tenths, 1);
        let in_range = (500..=700).contains(&tenths);
        prop_assert_eq!(validate_pupillary_distance(&value).is_ok(), in_range);
    }

    #[test]
    fn phone_numbers_with_9_to_15_digits_are_valid(
        digits in "[0-9]{9,15}",
        plus in any::<bool>(),
    ) {
        let phone = if plus { format!("+{digits}") } else { digits };
        prop_assert!(validate_phone_number(&phone).is_ok(), "{}", phone);
    }

    #[test]
    fn short_phone_numbers_are_invalid(digits in "[0-9]{1,7}") {
        prop_assert!(validate_phone_number(&digits).is_err());
    }

    #[test]
    fn phone_numbers_with_letters_are_invalid(phone in "[0-9]{4,8}[a-z ]{1,3}[0-9]{4,8}") {
        prop_assert!(validate_phone_number(&phone).is_err());
    }

    #[test]
    fn prices_in_cents_are_valid(price in cents_strategy()) {
        prop_assert!(validate_price(&price).is_ok());
    }

    #[test]
    fn negative_prices_are_invalid(cents in 1i64..10_000_000) {
        prop_assert!(validate_price(&Decimal::new(-cents, 2)).is_err());
    }

    #[test]
    fn payment_amount_must_be_positive(cents in -10_000i64..10_000) {
        let amount = Decimal::new(cents, 2);
        prop_assert_eq!(validate_payment_amount(&amount).is_ok(), cents > 0);
    }

    #[test]
    fn total_price_is_the_sum_with_two_places(prices in prop::collection::vec(cents_strategy(), 0..20)) {
        let expected: Decimal = prices.iter().copied().sum();
        let total = pricing::total_price(&prices);
        prop_assert_eq!(total, expected);
        prop_assert_eq!(total.scale(), 2);
    }

    #[test]
    fn rest_amount_balances_the_voucher(
        prices in prop::collection::vec(cents_strategy(), 0..10),
        lines in prop::collection::vec(cents_strategy(), 0..10),
    ) {
        let balance = VoucherBalance::compute(&prices, &lines);
        prop_assert_eq!(
            balance.rest_amount + balance.voucher_lines_total_amount,
            balance.orders_total_price
        );
        prop_assert_eq!(balance.rest_amount.scale(), 2);
    }

    #[test]
    fn order_reference_is_padded_to_six_digits(id in 1i32..1_000_000) {
        let reference = order::reference(id);
        prop_assert!(reference.starts_with("ODR_"));
        prop_assert_eq!(reference.len(), 10);
        prop_assert_eq!(reference[4..].parse::<i32>().ok(), Some(id));
    }
}
