//! Calendar primitives used throughout the planner.
//!
//! A [`PlanWeek`] is an ISO week (year + week number) and is the unit
//! the weekly assignment run operates on. [`DayPart`] partitions a field
//! day into the three slots capacity is tracked in, and [`SpacingUnit`]
//! expresses protocol visit spacing.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// An ISO week of a given ISO year.
///
/// Ordering follows the calendar: weeks compare by `(year, week)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanWeek {
    pub year: i32,
    pub week: u32,
}

impl PlanWeek {
    pub fn new(year: i32, week: u32) -> Self {
        PlanWeek { year, week }
    }

    /// The ISO week containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        PlanWeek {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// Monday of this week.
    ///
    /// Week numbers are validated on construction paths that parse user
    /// input, so an out-of-range week here is a programming error and
    /// falls back to week 1.
    pub fn monday(&self) -> NaiveDate {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .or_else(|| NaiveDate::from_isoywd_opt(self.year, 1, Weekday::Mon))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Friday of this week, the end of the field work week.
    pub fn friday(&self) -> NaiveDate {
        self.monday() + Duration::days(4)
    }

    /// The week immediately after this one.
    pub fn next(&self) -> Self {
        PlanWeek::from_date(self.monday() + Duration::days(7))
    }

    /// The week `n` weeks after this one.
    pub fn plus_weeks(&self, n: i64) -> Self {
        PlanWeek::from_date(self.monday() + Duration::days(7 * n))
    }
}

impl std::fmt::Display for PlanWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// The part of a field day a visit slot occupies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPart {
    Morning,
    Daytime,
    Evening,
}

impl DayPart {
    pub const ALL: [DayPart; 3] = [DayPart::Morning, DayPart::Daytime, DayPart::Evening];
}

/// Unit a protocol's visit spacing is expressed in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingUnit {
    Days,
    Weeks,
    Months,
}

impl SpacingUnit {
    /// Number of calendar days one unit of spacing stands for.
    ///
    /// Months are treated as 30 days, matching how protocol authors
    /// specify spacing.
    pub fn day_factor(&self) -> i64 {
        match self {
            SpacingUnit::Days => 1,
            SpacingUnit::Weeks => 7,
            SpacingUnit::Months => 30,
        }
    }

    /// The minimum gap in days implied by `value` units of spacing.
    pub fn gap_days(&self, value: u32) -> i64 {
        self.day_factor() * value as i64
    }
}
