use std::time::Duration;

use chime_models::{
    chrono::{Days, NaiveDateTime},
    reminder_time::ReminderTime,
};

/// The next wall-clock instant strictly after `now` at which `time` falls.
///
/// Exactly `now` counts as passed, so a reminder never fires on the boundary
/// it was computed at.
pub fn occurrence(time: &ReminderTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(*time.time());

    if today <= now {
        today
            .checked_add_days(Days::new(1))
            .expect("Not realistic to overflow")
    } else {
        today
    }
}

pub fn delay_until(target: NaiveDateTime, now: NaiveDateTime) -> Duration {
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chime_models::chrono::{NaiveDate, NaiveTime, TimeDelta, Timelike};
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn time(raw: &str) -> ReminderTime {
        raw.parse().unwrap()
    }

    #[test]
    fn exact_boundary_moves_to_tomorrow() {
        let now = at(2024, 1, 1, 6, 0);

        assert_eq!(occurrence(&time("06:00"), now), at(2024, 1, 2, 6, 0));
    }

    #[test]
    fn upcoming_time_stays_today() {
        let now = at(2024, 1, 1, 5, 59);

        assert_eq!(occurrence(&time("06:00"), now), at(2024, 1, 1, 6, 0));
    }

    #[test]
    fn passed_time_rolls_over_month_end() {
        let now = at(2024, 1, 31, 23, 30);

        assert_eq!(occurrence(&time("00:15"), now), at(2024, 2, 1, 0, 15));
    }

    #[test]
    fn sub_minute_remainder_counts_as_passed() {
        let now = at(2024, 1, 1, 6, 0) + TimeDelta::milliseconds(1);

        assert_eq!(occurrence(&time("06:00"), now), at(2024, 1, 2, 6, 0));
    }

    #[test]
    fn when_firing_time_is_yet_to_come_delay_is_less_than_day() {
        let now = at(2025, 5, 31, 12, 0);

        let delay = delay_until(occurrence(&time("13:00"), now), now);

        assert_eq!(delay, Duration::from_secs(60 * 60));
    }

    #[test]
    fn when_firing_time_is_passed_delay_reaches_next_day() {
        let now = at(2025, 5, 31, 12, 0);

        let delay = delay_until(occurrence(&time("11:00"), now), now);

        assert_eq!(delay, Duration::from_secs(23 * 60 * 60));
    }

    #[test]
    fn delay_to_the_past_is_zero() {
        let now = at(2025, 5, 31, 12, 0);

        assert_eq!(delay_until(at(2025, 5, 31, 11, 0), now), Duration::ZERO);
    }

    proptest! {
        #[test]
        fn occurrence_is_next_future_match(
            now in arb::<NaiveDateTime>(),
            fire_at in arb::<NaiveTime>()
        ) {
            prop_assume!(now.date() < NaiveDate::MAX);
            let fire_at = ReminderTime::from_time(fire_at);
            let now = now.with_nanosecond(0).unwrap();

            let target = occurrence(&fire_at, now);

            prop_assert!(target > now, "Occurrence should always be in the future");
            prop_assert_eq!(&target.time(), fire_at.time());
            prop_assert!(target - now <= TimeDelta::days(1), "Occurrence should be one day away or less");
        }
    }
}
