use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

/// Hours of poolish fermentation (room/cold) before the final mix.
pub const POOLISH_FERMENT_MIN_H: i64 = 17;
pub const POOLISH_FERMENT_MAX_H: i64 = 25;
/// Final mix to ready dough.
pub const FINAL_MIX_MIN_H: i64 = 2;
pub const FINAL_MIX_MAX_H: i64 = 3;

/// Human-facing date format, e.g. `Sun, 05-Jan-2025 14:00`.
pub const DISPLAY_FORMAT: &str = "%a, %d-%b-%Y %H:%M";

/// An advisory "start between" window.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub earliest: NaiveDateTime,
    pub latest: NaiveDateTime,
}

impl TimeWindow {
    /// Window opening `max_h` and closing `min_h` hours before `at`.
    fn before(at: NaiveDateTime, max_h: i64, min_h: i64) -> Self {
        Self {
            earliest: at - Duration::hours(max_h),
            latest: at - Duration::hours(min_h),
        }
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.earliest <= t && t <= self.latest
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "between {} and {}",
            self.earliest.format(DISPLAY_FORMAT),
            self.latest.format(DISPLAY_FORMAT)
        )
    }
}

/// When to start each stage so the dough is ready at the eat time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub poolish_start: TimeWindow,
    pub final_mix: TimeWindow,
}

/// Work backwards from the eat time. The poolish window adds the final mix
/// buffer (3h) on top of the fermentation range.
pub fn schedule_for(eat_at: NaiveDateTime) -> Schedule {
    Schedule {
        poolish_start: TimeWindow::before(
            eat_at,
            POOLISH_FERMENT_MAX_H + FINAL_MIX_MAX_H,
            POOLISH_FERMENT_MIN_H + FINAL_MIX_MAX_H,
        ),
        final_mix: TimeWindow::before(eat_at, FINAL_MIX_MAX_H, FINAL_MIX_MIN_H),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_windows_relative_to_eat_time() {
        let s = schedule_for(at("2025-01-05 18:00"));
        assert_eq!(s.final_mix.earliest, at("2025-01-05 15:00"));
        assert_eq!(s.final_mix.latest, at("2025-01-05 16:00"));
        assert_eq!(s.poolish_start.earliest, at("2025-01-04 14:00"));
        assert_eq!(s.poolish_start.latest, at("2025-01-04 22:00"));
        assert!(s.poolish_start.latest < s.final_mix.earliest);
    }

    #[test]
    fn test_window_display() {
        let s = schedule_for(at("2025-01-05 18:00"));
        assert_eq!(
            s.final_mix.to_string(),
            "between Sun, 05-Jan-2025 15:00 and Sun, 05-Jan-2025 16:00"
        );
        assert!(s.final_mix.contains(at("2025-01-05 15:30")));
        assert!(!s.final_mix.contains(at("2025-01-05 16:01")));
    }
}
