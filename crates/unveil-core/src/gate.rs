//! Annual time gate.
//!
//! Decides whether a wall-clock instant falls on a recurring calendar day and
//! how long remains until the next occurrence of that day.
//!
//! All computations use the local calendar date (`NaiveDateTime`) with no
//! timezone normalization. Behaviour across DST changes follows whatever the
//! host clock reports.
//!
//! ## Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use unveil_core::gate::{AnnualWindow, countdown, is_within_window};
//!
//! let window = AnnualWindow::new(0, 20).unwrap();
//! let now = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap().and_hms_opt(23, 59, 59).unwrap();
//! assert!(!is_within_window(window, now));
//! assert_eq!(countdown(window, now).unwrap().seconds, 1);
//! ```

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MS_PER_SECOND: i64 = 1000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// A recurring calendar day, e.g. "January 20th of every year".
///
/// `month` is zero-based (0 = January). A day that does not exist in a given
/// year (Feb 29 outside leap years, Apr 31) rolls forward into the following
/// month for that year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualWindow {
    month: u32,
    day: u32,
}

impl AnnualWindow {
    pub fn new(month: u32, day: u32) -> Result<Self, ValidationError> {
        if month > 11 || !(1..=31).contains(&day) {
            return Err(ValidationError::InvalidWindow { month, day });
        }
        Ok(Self { month, day })
    }

    /// Zero-based month (0 = January).
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// 00:00:00.000 of the window day in `year`.
    pub fn start_in(&self, year: i32) -> NaiveDateTime {
        let first_of_month =
            NaiveDate::from_ymd_opt(year, self.month + 1, 1).unwrap_or(NaiveDate::MAX);
        first_of_month
            .checked_add_signed(Duration::days(i64::from(self.day) - 1))
            .unwrap_or(NaiveDate::MAX)
            .and_time(chrono::NaiveTime::MIN)
    }

    /// 23:59:59.999 of the window day in `year`.
    pub fn end_in(&self, year: i32) -> NaiveDateTime {
        self.start_in(year) + Duration::days(1) - Duration::milliseconds(1)
    }
}

/// Remaining time until the window opens, split into display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    pub days: u64,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl CountdownSnapshot {
    /// Split a positive millisecond delta. Returns `None` once the delta has
    /// reached zero, which is the signal to unlock.
    pub fn from_millis(remaining_ms: i64) -> Option<Self> {
        if remaining_ms <= 0 {
            return None;
        }
        Some(Self {
            days: (remaining_ms / MS_PER_DAY) as u64,
            hours: ((remaining_ms % MS_PER_DAY) / MS_PER_HOUR) as u32,
            minutes: ((remaining_ms % MS_PER_HOUR) / MS_PER_MINUTE) as u32,
            seconds: ((remaining_ms % MS_PER_MINUTE) / MS_PER_SECOND) as u32,
        })
    }

    /// Two-digit (or wider, for large day counts) cell values in
    /// days/hours/minutes/seconds order.
    pub fn padded(&self) -> [String; 4] {
        [
            pad_number(self.days, 2),
            pad_number(u64::from(self.hours), 2),
            pad_number(u64::from(self.minutes), 2),
            pad_number(u64::from(self.seconds), 2),
        ]
    }
}

impl std::fmt::Display for CountdownSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [d, h, m, s] = self.padded();
        write!(f, "{d}d {h}:{m}:{s}")
    }
}

/// Left-pad with zeros to at least `size` digits.
pub fn pad_number(value: u64, size: usize) -> String {
    format!("{value:0>size$}")
}

/// Start of the window in the current year, or in the following year once
/// the current year's window day has fully passed.
pub fn next_occurrence(window: AnnualWindow, now: NaiveDateTime) -> NaiveDateTime {
    let year = now.year();
    if now > window.end_in(year) {
        window.start_in(year + 1)
    } else {
        window.start_in(year)
    }
}

/// True iff `now` lies between the window day's first and last millisecond,
/// both inclusive.
pub fn is_within_window(window: AnnualWindow, now: NaiveDateTime) -> bool {
    let year = now.year();
    now >= window.start_in(year) && now <= window.end_in(year)
}

/// Milliseconds from `now` until the next window start. Zero or negative
/// while the window is open.
pub fn remaining_ms(window: AnnualWindow, now: NaiveDateTime) -> i64 {
    (next_occurrence(window, now) - now).num_milliseconds()
}

pub fn countdown(window: AnnualWindow, now: NaiveDateTime) -> Option<CountdownSnapshot> {
    CountdownSnapshot::from_millis(remaining_ms(window, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::from_hms_milli_opt(h, min, s, ms).unwrap())
    }

    fn jan20() -> AnnualWindow {
        AnnualWindow::new(0, 20).unwrap()
    }

    #[test]
    fn rejects_invalid_month_and_day() {
        assert!(AnnualWindow::new(12, 1).is_err());
        assert!(AnnualWindow::new(0, 0).is_err());
        assert!(AnnualWindow::new(0, 32).is_err());
        assert!(AnnualWindow::new(11, 31).is_ok());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        assert!(is_within_window(jan20(), at(2026, 1, 20, 0, 0, 0, 0)));
        assert!(is_within_window(jan20(), at(2026, 1, 20, 23, 59, 59, 999)));
        assert!(!is_within_window(jan20(), at(2026, 1, 19, 23, 59, 59, 999)));
        assert!(!is_within_window(jan20(), at(2026, 1, 21, 0, 0, 0, 0)));
    }

    #[test]
    fn next_occurrence_stays_in_year_until_end_of_day() {
        let start = at(2026, 1, 20, 0, 0, 0, 0);
        assert_eq!(next_occurrence(jan20(), at(2026, 1, 1, 12, 0, 0, 0)), start);
        assert_eq!(next_occurrence(jan20(), at(2026, 1, 20, 23, 59, 59, 999)), start);
        assert_eq!(
            next_occurrence(jan20(), at(2026, 1, 21, 0, 0, 0, 0)),
            at(2027, 1, 20, 0, 0, 0, 0)
        );
    }

    #[test]
    fn leap_day_rolls_into_march_outside_leap_years() {
        let window = AnnualWindow::new(1, 29).unwrap();
        assert_eq!(window.start_in(2027), at(2027, 3, 1, 0, 0, 0, 0));
        assert_eq!(window.start_in(2028), at(2028, 2, 29, 0, 0, 0, 0));
        assert!(is_within_window(window, at(2027, 3, 1, 8, 0, 0, 0)));
    }

    #[test]
    fn one_second_before_window_counts_down_one_second() {
        let snap = countdown(jan20(), at(2026, 1, 19, 23, 59, 59, 0)).unwrap();
        assert_eq!(
            snap,
            CountdownSnapshot {
                days: 0,
                hours: 0,
                minutes: 0,
                seconds: 1
            }
        );
        assert!(countdown(jan20(), at(2026, 1, 20, 0, 0, 0, 0)).is_none());
    }

    #[test]
    fn countdown_splits_units() {
        let snap = countdown(jan20(), at(2026, 1, 17, 21, 30, 15, 0)).unwrap();
        assert_eq!(snap.days, 2);
        assert_eq!(snap.hours, 2);
        assert_eq!(snap.minutes, 29);
        assert_eq!(snap.seconds, 45);
        assert_eq!(snap.to_string(), "02d 02:29:45");
    }

    #[test]
    fn pad_number_keeps_wide_values() {
        assert_eq!(pad_number(7, 2), "07");
        assert_eq!(pad_number(365, 2), "365");
    }

    fn any_instant() -> impl Strategy<Value = NaiveDateTime> {
        (1990i32..2100, 0i64..366 * MS_PER_DAY).prop_map(|(year, offset)| {
            NaiveDate::from_ymd_opt(year, 1, 1).unwrap().and_time(NaiveTime::MIN)
                + Duration::milliseconds(offset)
        })
    }

    proptest! {
        #[test]
        fn snapshot_fields_stay_in_range(ms in 1i64..(800 * MS_PER_DAY)) {
            let snap = CountdownSnapshot::from_millis(ms).unwrap();
            prop_assert!(snap.seconds < 60);
            prop_assert!(snap.minutes < 60);
            prop_assert!(snap.hours < 24);
        }

        #[test]
        fn after_window_targets_following_year(now in any_instant(), month in 0u32..12, day in 1u32..29) {
            let window = AnnualWindow::new(month, day).unwrap();
            let next = next_occurrence(window, now);
            if now > window.end_in(now.year()) {
                prop_assert!(!is_within_window(window, now));
                prop_assert_eq!(next.year(), now.year() + 1);
            } else {
                prop_assert_eq!(next.year(), now.year());
            }
        }

        #[test]
        fn every_millisecond_of_the_day_is_within(offset in 0i64..MS_PER_DAY, year in 1990i32..2100) {
            let window = jan20();
            let now = window.start_in(year) + Duration::milliseconds(offset);
            prop_assert!(is_within_window(window, now));
            prop_assert!(countdown(window, now).is_none());
        }
    }
}
