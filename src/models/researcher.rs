//! Researchers, their qualifications, and their availability records.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::calendar::{DayPart, PlanWeek};
use super::catalog::{LogisticsFlag, SpeciesFamily};
use super::ids::ResearcherId;

/// What a researcher is certified and equipped to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifications {
    pub families: BTreeSet<SpeciesFamily>,
    pub logistics: BTreeSet<LogisticsFlag>,
    /// Certified for flight-route and foraging-area surveys.
    pub overflight_route: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Researcher {
    pub id: ResearcherId,
    pub name: String,
    pub qualifications: Qualifications,
}

/// Manual per-week capacity override; wins over any pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWeek {
    pub researcher_id: ResearcherId,
    pub week: PlanWeek,
    pub morning_slots: u32,
    pub daytime_slots: u32,
    pub evening_slots: u32,
}

impl AvailabilityWeek {
    pub fn slots(&self, day_part: DayPart) -> u32 {
        match day_part {
            DayPart::Morning => self.morning_slots,
            DayPart::Daytime => self.daytime_slots,
            DayPart::Evening => self.evening_slots,
        }
    }

    pub fn set_slots(&mut self, day_part: DayPart, slots: u32) {
        match day_part {
            DayPart::Morning => self.morning_slots = slots,
            DayPart::Daytime => self.daytime_slots = slots,
            DayPart::Evening => self.evening_slots = slots,
        }
    }
}

/// Optional weekly ceilings a pattern can impose per day-part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyCaps {
    pub morning: Option<u32>,
    pub daytime: Option<u32>,
    pub evening: Option<u32>,
}

impl WeeklyCaps {
    pub fn cap(&self, day_part: DayPart) -> Option<u32> {
        match day_part {
            DayPart::Morning => self.morning,
            DayPart::Daytime => self.daytime,
            DayPart::Evening => self.evening,
        }
    }
}

/// Recurring weekly availability over a date range.
///
/// Ranges of one researcher's patterns may not overlap; the availability
/// service rejects conflicting writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityPattern {
    pub id: i64,
    pub researcher_id: ResearcherId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Day-parts the researcher works, per weekday.
    pub schedule: HashMap<Weekday, BTreeSet<DayPart>>,
    pub weekly_caps: WeeklyCaps,
}

impl AvailabilityPattern {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Count of weekdays (Monday through Friday) whose schedule opens the
    /// given day-part, clamped by the weekly cap when one is set.
    pub fn weekly_slots(&self, day_part: DayPart) -> u32 {
        const WEEKDAYS: [Weekday; 5] = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ];
        let open = WEEKDAYS
            .iter()
            .filter(|day| {
                self.schedule
                    .get(day)
                    .map(|parts| parts.contains(&day_part))
                    .unwrap_or(false)
            })
            .count() as u32;
        match self.weekly_caps.cap(day_part) {
            Some(cap) => open.min(cap),
            None => open,
        }
    }
}

/// A date range during which a researcher is out for given day-parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailabilityPeriod {
    pub id: i64,
    pub researcher_id: ResearcherId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub morning: bool,
    pub daytime: bool,
    pub evening: bool,
}

impl UnavailabilityPeriod {
    pub fn blocks(&self, day_part: DayPart) -> bool {
        match day_part {
            DayPart::Morning => self.morning,
            DayPart::Daytime => self.daytime,
            DayPart::Evening => self.evening,
        }
    }
}
