//! Cycle clock
//!
//! Converts wall-clock time into a cycle day number and derives the expected
//! ovulation window from the average cycle length.

use chrono::{DateTime, NaiveTime, Utc};

use crate::types::{CycleConfig, CycleDay, OvulationWindow, WindowStatus};

const SECONDS_PER_DAY: i64 = 86_400;

/// Day of the current cycle at `now`. The start date is day 1.
///
/// The start date is anchored at 00:00 UTC and elapsed time is floored to whole
/// days, so hours within a day never advance the count.
pub fn current_day(config: &CycleConfig, now: DateTime<Utc>) -> CycleDay {
    let start = config
        .cycle_start_date
        .and_time(NaiveTime::MIN)
        .and_utc();
    let elapsed_secs = (now - start).num_seconds();
    CycleDay(elapsed_secs.div_euclid(SECONDS_PER_DAY) + 1)
}

/// Expected ovulation window: `floor(0.5 * avg)` through `floor(0.7 * avg)`.
///
/// Integer arithmetic keeps the floor exact. Short cycles may collapse the
/// window to a single day.
pub fn expected_ovulation_window(config: &CycleConfig) -> OvulationWindow {
    let avg = i64::from(config.average_cycle_length_days());
    OvulationWindow {
        min_day: avg * 5 / 10,
        max_day: avg * 7 / 10,
    }
}

/// Where `now` falls relative to the expected window
pub fn window_status(config: &CycleConfig, now: DateTime<Utc>) -> WindowStatus {
    let cycle_day = current_day(config, now);
    let window = expected_ovulation_window(config);
    WindowStatus {
        cycle_day,
        window,
        in_window: window.contains(cycle_day),
        days_until_window: (window.min_day - cycle_day.value()).max(0),
    }
}
