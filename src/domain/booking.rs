use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::benefit::BenefitOutcome;

pub const DEFAULT_BOOKING_TYPE: &str = "play";

/// A booking about to be priced
///
/// `booking_type` is free-form (`play`, `event`, `dining`, ...) and is stored lower-cased. The
/// price is never negative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingCandidate {
    booking_type: String,
    original_amount: Decimal,
}

impl BookingCandidate {
    /// Returns `None` for a negative price
    pub fn new(booking_type: Option<&str>, original_amount: Decimal) -> Option<Self> {
        if original_amount < Decimal::ZERO {
            return None;
        }

        let booking_type = booking_type
            .map(str::trim)
            .filter(|booking_type| !booking_type.is_empty())
            .unwrap_or(DEFAULT_BOOKING_TYPE)
            .to_lowercase();

        Some(Self {
            booking_type,
            original_amount,
        })
    }

    pub fn booking_type(&self) -> &str {
        &self.booking_type
    }

    pub fn original_amount(&self) -> Decimal {
        self.original_amount
    }
}

/// A priced reservation for an event, dining slot or sports venue
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub booking_type: String,
    pub venue_name: String,
    pub booking_date: String,
    pub original_amount: Decimal,
    pub total_amount: Decimal,
    pub pass_benefit_applied: Option<String>,
    pub savings_amount: Decimal,
}

impl Booking {
    pub fn new(
        venue_name: impl Into<String>,
        booking_date: impl Into<String>,
        candidate: BookingCandidate,
        outcome: BenefitOutcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_type: candidate.booking_type,
            venue_name: venue_name.into(),
            booking_date: booking_date.into(),
            original_amount: candidate.original_amount,
            total_amount: outcome.total_amount,
            pass_benefit_applied: outcome.pass_benefit_applied,
            savings_amount: outcome.savings_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use speculoos::prelude::*;

    #[rstest]
    #[case(None, "play")]
    #[case(Some(""), "play")]
    #[case(Some(" Dining "), "dining")]
    #[case(Some("event"), "event")]
    fn test_candidate_booking_type(#[case] input: Option<&str>, #[case] expected: &str) {
        let candidate = BookingCandidate::new(input, Decimal::new(1000, 0)).unwrap();

        assert_that!(candidate.booking_type()).is_equal_to(expected);
    }

    #[test]
    fn test_candidate_rejects_negative_price() {
        assert_that!(BookingCandidate::new(None, Decimal::new(-1, 0))).is_none();
        assert_that!(BookingCandidate::new(None, Decimal::ZERO)).is_some();
    }

    #[test]
    fn test_booking_from_outcome() {
        let candidate = BookingCandidate::new(Some("play"), Decimal::new(1000, 0)).unwrap();
        let outcome = BenefitOutcome {
            total_amount: Decimal::new(800, 0),
            pass_benefit_applied: Some("20% off play bookings".to_string()),
            savings_amount: Decimal::new(200, 0),
        };

        let booking = Booking::new("Center Court", "2026-11-02", candidate, outcome);

        assert_that!(booking.original_amount).is_equal_to(Decimal::new(1000, 0));
        assert_that!(booking.total_amount).is_equal_to(Decimal::new(800, 0));
        assert_that!(booking.savings_amount).is_equal_to(Decimal::new(200, 0));
        assert_that!(booking.booking_type.as_str()).is_equal_to("play");
    }
}
