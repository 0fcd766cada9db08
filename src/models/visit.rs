//! Visits and their derived status.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;

use super::calendar::{DayPart, PlanWeek};
use super::catalog::LogisticsFlag;
use super::ids::{ClusterId, FunctionId, ResearcherId, SpeciesId, VisitId, WindowId};

/// A planned or historical field visit of a cluster.
///
/// Relation sets are plain id collections; writes replace them wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub cluster_id: ClusterId,
    /// Position of this visit within its cluster's sequence, when known.
    pub visit_nr: Option<u32>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub day_part: Option<DayPart>,
    pub required_researchers: u32,
    pub priority: bool,
    /// Logistics a researcher must bring to work this visit.
    pub logistics: BTreeSet<LogisticsFlag>,
    /// Manual planning overrides: a locked visit is never re-planned.
    pub planning_locked: bool,
    pub planned_week: Option<PlanWeek>,
    pub provisional_week: Option<PlanWeek>,
    pub provisional_locked: bool,
    /// Set on ad-hoc visits that sit outside protocol sequencing.
    pub custom_label: Option<String>,
    pub function_ids: Vec<FunctionId>,
    pub species_ids: Vec<SpeciesId>,
    pub researcher_ids: Vec<ResearcherId>,
    pub window_ids: Vec<WindowId>,
}

impl Visit {
    /// Ad-hoc visits bypass protocol sequencing and frequency checks.
    pub fn is_custom(&self) -> bool {
        self.custom_label.is_some()
    }

    /// A visit counts as locked once researchers are committed to it.
    pub fn is_locked(&self) -> bool {
        !self.researcher_ids.is_empty()
    }

    /// Whether the visit's date window overlaps `[start, end]`.
    ///
    /// Visits without both dates never overlap anything.
    pub fn window_overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        match (self.from_date, self.to_date) {
            (Some(from), Some(to)) => from <= end && to >= start,
            _ => false,
        }
    }
}

/// Derived lifecycle state of a visit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Created,
    Open,
    Planned,
    Missed,
    Overdue,
    Executed,
    ExecutedWithDeviation,
    NotExecuted,
    Approved,
    Rejected,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bare_visit() -> Visit {
        Visit {
            id: VisitId::new(1),
            cluster_id: ClusterId::new(1),
            visit_nr: Some(1),
            from_date: None,
            to_date: None,
            day_part: Some(DayPart::Morning),
            required_researchers: 1,
            priority: false,
            logistics: BTreeSet::new(),
            planning_locked: false,
            planned_week: None,
            provisional_week: None,
            provisional_locked: false,
            custom_label: None,
            function_ids: vec![],
            species_ids: vec![],
            researcher_ids: vec![],
            window_ids: vec![],
        }
    }

    #[test]
    fn test_locked_means_researchers() {
        let mut visit = bare_visit();
        assert!(!visit.is_locked());
        visit.researcher_ids.push(ResearcherId::new(5));
        assert!(visit.is_locked());
    }

    #[test]
    fn test_window_overlap_requires_both_dates() {
        let mut visit = bare_visit();
        visit.from_date = Some(date(2026, 5, 11));
        assert!(!visit.window_overlaps(date(2026, 5, 11), date(2026, 5, 15)));
        visit.to_date = Some(date(2026, 5, 12));
        assert!(visit.window_overlaps(date(2026, 5, 11), date(2026, 5, 15)));
        assert!(!visit.window_overlaps(date(2026, 5, 18), date(2026, 5, 22)));
    }
}
