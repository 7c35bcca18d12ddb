use serde::Serialize;
use sqlx::FromRow;

/// A quantity of tickets reserved against an event. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: i64,
    pub num_tickets: i32,
    pub user_id: i64,
    pub event_id: i64,
}

/// Outcome of checking a booking request against remaining inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingDecision {
    /// The request fits. `remaining` is the inventory after the decrement;
    /// `sold_out` is set when it hit exactly zero.
    Accepted { remaining: i32, sold_out: bool },
    /// The request asks for more tickets than are left.
    Oversell,
}

/// The availability check at the heart of the booking transaction.
/// A request for `requested` tickets against `remaining` succeeds iff
/// `requested <= remaining`; inventory never goes negative.
pub fn evaluate(remaining: i32, requested: i32) -> BookingDecision {
    if requested > remaining {
        return BookingDecision::Oversell;
    }
    let left = remaining - requested;
    BookingDecision::Accepted {
        remaining: left,
        sold_out: left == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn booking_scenario_five_three_two_one() {
        // 5 remaining, book 3: succeeds, 2 left, not sold out
        assert_eq!(
            evaluate(5, 3),
            BookingDecision::Accepted { remaining: 2, sold_out: false }
        );
        // then book 2: succeeds, 0 left, sold out
        assert_eq!(
            evaluate(2, 2),
            BookingDecision::Accepted { remaining: 0, sold_out: true }
        );
        // then book 1: rejected, inventory unchanged
        assert_eq!(evaluate(0, 1), BookingDecision::Oversell);
    }

    #[test]
    fn exact_fit_sells_out() {
        assert_eq!(
            evaluate(10, 10),
            BookingDecision::Accepted { remaining: 0, sold_out: true }
        );
    }

    proptest! {
        #[test]
        fn accepts_iff_request_fits(remaining in 0i32..10_000, requested in 1i32..10_000) {
            match evaluate(remaining, requested) {
                BookingDecision::Accepted { remaining: left, sold_out } => {
                    prop_assert!(requested <= remaining);
                    prop_assert_eq!(left, remaining - requested);
                    prop_assert!(left >= 0);
                    prop_assert_eq!(sold_out, left == 0);
                }
                BookingDecision::Oversell => {
                    prop_assert!(requested > remaining);
                }
            }
        }
    }
}
