use std::{collections::HashMap, fmt};

use rust_decimal::Decimal;
use serde::Serialize;

use super::{booking::BookingCandidate, PassStatus};

/// A discount granted to bookings of one type while a pass is active
pub trait BenefitRule: Send + Sync {
    /// Discount for the given price, before clamping
    fn discount(&self, original_amount: Decimal) -> Decimal;

    /// Human-readable description of the benefit, e.g. `20% off play bookings`
    fn describe(&self, booking_type: &str) -> String;
}

/// Percentage off the original price
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PercentageDiscount(Decimal);

impl PercentageDiscount {
    /// Returns `None` unless `0 <= percent <= 100`
    pub fn new(percent: Decimal) -> Option<Self> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            None
        } else {
            Some(Self(percent))
        }
    }
}

impl BenefitRule for PercentageDiscount {
    fn discount(&self, original_amount: Decimal) -> Decimal {
        // Scale the rate first so the product never exceeds the price
        (original_amount * (self.0 / Decimal::ONE_HUNDRED)).round_dp(2)
    }

    fn describe(&self, booking_type: &str) -> String {
        format!("{}% off {booking_type} bookings", self.0.normalize())
    }
}

/// Fixed amount off the original price
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatDiscount(Decimal);

impl FlatDiscount {
    /// Returns `None` for a negative amount
    pub fn new(amount: Decimal) -> Option<Self> {
        (amount >= Decimal::ZERO).then_some(Self(amount))
    }
}

impl BenefitRule for FlatDiscount {
    fn discount(&self, _original_amount: Decimal) -> Decimal {
        self.0
    }

    fn describe(&self, booking_type: &str) -> String {
        format!("{} off {booking_type} bookings", self.0.normalize())
    }
}

/// Pricing fields for a booking once pass benefits are taken into account
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitOutcome {
    pub total_amount: Decimal,
    pub pass_benefit_applied: Option<String>,
    pub savings_amount: Decimal,
}

impl BenefitOutcome {
    fn without_benefit(original_amount: Decimal) -> Self {
        Self {
            total_amount: original_amount,
            pass_benefit_applied: None,
            savings_amount: Decimal::ZERO,
        }
    }
}

/// Benefit rules keyed by booking type
#[derive(Default)]
pub struct BenefitRules {
    rules: HashMap<String, Box<dyn BenefitRule>>,
}

impl fmt::Debug for BenefitRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BenefitRules")
            .field("booking_types", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BenefitRules {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register the rule for a booking type, replacing any previous one
    pub fn with_rule(mut self, booking_type: &str, rule: impl BenefitRule + 'static) -> Self {
        self.rules
            .insert(booking_type.trim().to_lowercase(), Box::new(rule));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Price a booking for the given pass status
    ///
    /// Only an active pass grants a benefit. The result always satisfies
    /// `0 <= total_amount <= original_amount` and
    /// `savings_amount == original_amount - total_amount`.
    pub fn apply(&self, status: PassStatus, booking: &BookingCandidate) -> BenefitOutcome {
        let original_amount = booking.original_amount();

        if status != PassStatus::Active {
            return BenefitOutcome::without_benefit(original_amount);
        }
        let Some(rule) = self.rules.get(booking.booking_type()) else {
            return BenefitOutcome::without_benefit(original_amount);
        };

        let savings_amount = rule
            .discount(original_amount)
            .clamp(Decimal::ZERO, original_amount);

        BenefitOutcome {
            total_amount: original_amount - savings_amount,
            pass_benefit_applied: Some(rule.describe(booking.booking_type())),
            savings_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use speculoos::prelude::*;

    #[fixture]
    fn rules() -> BenefitRules {
        BenefitRules::empty()
            .with_rule("play", PercentageDiscount::new(Decimal::new(20, 0)).unwrap())
            .with_rule("Dining", FlatDiscount::new(Decimal::new(150, 0)).unwrap())
    }

    fn booking(booking_type: &str, amount: i64) -> BookingCandidate {
        BookingCandidate::new(Some(booking_type), Decimal::new(amount, 0)).unwrap()
    }

    #[rstest]
    fn test_active_pass_booking(rules: BenefitRules) {
        let res = rules.apply(PassStatus::Active, &booking("play", 1000));

        assert_that!(res.total_amount).is_equal_to(Decimal::new(800, 0));
        assert_that!(res.savings_amount).is_equal_to(Decimal::new(200, 0));
        assert_that!(res.pass_benefit_applied.as_deref()).is_equal_to(Some("20% off play bookings"));
    }

    #[rstest]
    #[case(PassStatus::Expired)]
    #[case(PassStatus::NotFound)]
    fn test_no_benefit_without_active_pass(rules: BenefitRules, #[case] status: PassStatus) {
        let res = rules.apply(status, &booking("play", 1000));

        assert_that!(res).is_equal_to(BenefitOutcome {
            total_amount: Decimal::new(1000, 0),
            pass_benefit_applied: None,
            savings_amount: Decimal::ZERO,
        });
    }

    #[rstest]
    fn test_unregistered_type(rules: BenefitRules) {
        let res = rules.apply(PassStatus::Active, &booking("event", 1000));

        assert_that!(res.total_amount).is_equal_to(Decimal::new(1000, 0));
        assert_that!(res.pass_benefit_applied).is_none();
    }

    /// A flat discount larger than the price never yields a negative total
    #[rstest]
    fn test_flat_discount_clamped(rules: BenefitRules) {
        let res = rules.apply(PassStatus::Active, &booking("dining", 100));

        assert_that!(res.total_amount).is_equal_to(Decimal::ZERO);
        assert_that!(res.savings_amount).is_equal_to(Decimal::new(100, 0));
        assert_that!(res.pass_benefit_applied.as_deref()).is_equal_to(Some("150 off dining bookings"));
    }

    #[rstest]
    fn test_percentage_rounds_to_cents() {
        let rules = BenefitRules::empty()
            .with_rule("play", PercentageDiscount::new(Decimal::new(125, 1)).unwrap());
        let candidate = BookingCandidate::new(None, Decimal::new(999, 2)).unwrap();

        let res = rules.apply(PassStatus::Active, &candidate);

        // 12.5% of 9.99 = 1.24875
        assert_that!(res.savings_amount).is_equal_to(Decimal::new(125, 2));
        assert_that!(res.total_amount).is_equal_to(Decimal::new(874, 2));
    }

    #[rstest]
    fn test_invariants_hold(
        rules: BenefitRules,
        #[values(PassStatus::Active, PassStatus::Expired, PassStatus::NotFound)] status: PassStatus,
        #[values("play", "dining", "event")] booking_type: &str,
        #[values(0, 1, 99, 150, 1000, 123456)] amount: i64,
    ) {
        let candidate = booking(booking_type, amount);

        let res = rules.apply(status, &candidate);

        assert_that!(res.total_amount >= Decimal::ZERO).is_true();
        assert_that!(res.total_amount <= candidate.original_amount()).is_true();
        assert_that!(res.savings_amount)
            .is_equal_to(candidate.original_amount() - res.total_amount);
        // Same input, same output
        assert_that!(rules.apply(status, &candidate)).is_equal_to(res);
    }

    /// The largest representable price still prices without overflowing
    #[rstest]
    #[case("play")]
    #[case("dining")]
    fn test_largest_price(rules: BenefitRules, #[case] booking_type: &str) {
        let candidate = BookingCandidate::new(Some(booking_type), Decimal::MAX).unwrap();

        let res = rules.apply(PassStatus::Active, &candidate);

        assert_that!(res.pass_benefit_applied).is_some();
        assert_that!(res.total_amount >= Decimal::ZERO).is_true();
        assert_that!(res.total_amount < Decimal::MAX).is_true();
        assert_that!(res.savings_amount).is_equal_to(Decimal::MAX - res.total_amount);
    }

    #[rstest]
    fn test_full_percentage_on_largest_price() {
        let rules = BenefitRules::empty()
            .with_rule("play", PercentageDiscount::new(Decimal::ONE_HUNDRED).unwrap());
        let candidate = BookingCandidate::new(None, Decimal::MAX).unwrap();

        let res = rules.apply(PassStatus::Active, &candidate);

        assert_that!(res.total_amount).is_equal_to(Decimal::ZERO);
        assert_that!(res.savings_amount).is_equal_to(Decimal::MAX);
    }

    #[test]
    fn test_rule_constructors() {
        assert_that!(PercentageDiscount::new(Decimal::new(101, 0))).is_none();
        assert_that!(PercentageDiscount::new(Decimal::new(-1, 0))).is_none();
        assert_that!(FlatDiscount::new(Decimal::new(-1, 0))).is_none();
        assert_that!(FlatDiscount::new(Decimal::ZERO)).is_some();
    }
}
