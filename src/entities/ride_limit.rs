use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Singleton ledger of bid/accept actions taken per rider per service day.
/// Callers must hold the ledger's row lock while checking and incrementing,
/// and must call `roll_over` with the current service day before either.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RideLimit {
    pub daily_limit: u32,
    pub last_reset_date: NaiveDate,
    pub daily_usage: HashMap<Uuid, Usage>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Usage {
    pub rides_used: u32,
    pub date: NaiveDate,
}

#[derive(Clone, Debug, Serialize)]
pub struct Eligibility {
    pub can_take_action: bool,
    pub remaining_rides: u32,
    pub reason: Option<String>,
}

impl RideLimit {
    pub fn new(daily_limit: u32, today: NaiveDate) -> Self {
        Self {
            daily_limit,
            last_reset_date: today,
            daily_usage: HashMap::new(),
        }
    }

    /// Clears all usage when the stored day is older than `today`. Returns
    /// whether a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.last_reset_date < today {
            self.daily_usage.clear();
            self.last_reset_date = today;
            return true;
        }

        false
    }

    pub fn rides_used(&self, rider_id: &Uuid, today: NaiveDate) -> u32 {
        if self.last_reset_date < today {
            return 0;
        }

        match self.daily_usage.get(rider_id) {
            Some(usage) if usage.date == today => usage.rides_used,
            _ => 0,
        }
    }

    pub fn remaining_rides(&self, rider_id: &Uuid, today: NaiveDate) -> u32 {
        self.daily_limit
            .saturating_sub(self.rides_used(rider_id, today))
    }

    pub fn can_take_ride_action(&self, rider_id: &Uuid, today: NaiveDate) -> Eligibility {
        let remaining_rides = self.remaining_rides(rider_id, today);

        if remaining_rides > 0 {
            Eligibility {
                can_take_action: true,
                remaining_rides,
                reason: None,
            }
        } else {
            Eligibility {
                can_take_action: false,
                remaining_rides,
                reason: Some(format!(
                    "daily limit of {} ride actions reached",
                    self.daily_limit
                )),
            }
        }
    }

    /// Records one consumed action. Only call after `can_take_ride_action`
    /// allowed it under the same lock.
    pub fn increment_ride_count(&mut self, rider_id: Uuid, today: NaiveDate) -> u32 {
        let usage = self.daily_usage.entry(rider_id).or_insert(Usage {
            rides_used: 0,
            date: today,
        });

        if usage.date < today {
            usage.rides_used = 0;
            usage.date = today;
        }

        usage.rides_used += 1;
        usage.rides_used
    }

    /// Hands back consumed actions when a bid is voided, floored at zero.
    /// Returns `(previous, new)` counts when anything actually changed.
    pub fn restore_ride_count(&mut self, rider_id: &Uuid, count: u32) -> Option<(u32, u32)> {
        match self.daily_usage.get_mut(rider_id) {
            Some(usage) if usage.rides_used > 0 => {
                let previous = usage.rides_used;
                usage.rides_used = usage.rides_used.saturating_sub(count);
                Some((previous, usage.rides_used))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn fresh_rider_has_full_limit() {
        let limit = RideLimit::new(10, day(1));
        let rider = Uuid::new_v4();

        assert_eq!(limit.remaining_rides(&rider, day(1)), 10);
        assert!(limit.can_take_ride_action(&rider, day(1)).can_take_action);
    }

    #[test]
    fn quota_is_a_hard_ceiling() {
        let mut limit = RideLimit::new(2, day(1));
        let rider = Uuid::new_v4();

        for _ in 0..2 {
            assert!(limit.can_take_ride_action(&rider, day(1)).can_take_action);
            limit.increment_ride_count(rider, day(1));
        }

        let eligibility = limit.can_take_ride_action(&rider, day(1));
        assert!(!eligibility.can_take_action);
        assert_eq!(eligibility.remaining_rides, 0);
        assert!(eligibility.reason.is_some());
    }

    #[test]
    fn restore_is_the_inverse_of_increment() {
        let mut limit = RideLimit::new(5, day(1));
        let rider = Uuid::new_v4();

        limit.increment_ride_count(rider, day(1));
        limit.increment_ride_count(rider, day(1));
        assert_eq!(limit.rides_used(&rider, day(1)), 2);

        assert_eq!(limit.restore_ride_count(&rider, 1), Some((2, 1)));
        assert_eq!(limit.rides_used(&rider, day(1)), 1);
    }

    #[test]
    fn restore_clamps_at_zero() {
        let mut limit = RideLimit::new(5, day(1));
        let rider = Uuid::new_v4();

        limit.increment_ride_count(rider, day(1));
        assert_eq!(limit.restore_ride_count(&rider, 3), Some((1, 0)));

        // Nothing left to hand back, including for unknown riders.
        assert_eq!(limit.restore_ride_count(&rider, 1), None);
        assert_eq!(limit.restore_ride_count(&Uuid::new_v4(), 1), None);
    }

    #[test]
    fn roll_over_resets_all_usage() {
        let mut limit = RideLimit::new(2, day(1));
        let rider = Uuid::new_v4();

        limit.increment_ride_count(rider, day(1));
        limit.increment_ride_count(rider, day(1));
        assert_eq!(limit.remaining_rides(&rider, day(1)), 0);

        assert!(limit.roll_over(day(2)));
        assert_eq!(limit.last_reset_date, day(2));
        assert!(limit.daily_usage.is_empty());
        assert_eq!(limit.remaining_rides(&rider, day(2)), 2);

        assert!(!limit.roll_over(day(2)));
    }

    #[test]
    fn stale_ledger_reads_as_full_limit_without_mutation() {
        let mut limit = RideLimit::new(3, day(1));
        let rider = Uuid::new_v4();
        limit.increment_ride_count(rider, day(1));

        // Read path: yesterday's usage does not count against today.
        assert_eq!(limit.remaining_rides(&rider, day(2)), 3);
        assert_eq!(limit.last_reset_date, day(1));
    }
}
