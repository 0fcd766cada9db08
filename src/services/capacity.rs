//! Per-week capacity accounting.
//!
//! A [`CapacityLedger`] is built fresh for each planning round from
//! availability records and already-committed assignments, then consumed
//! in memory as the engine reserves slots. Snapshots make the engine's
//! trial-and-rollback search cheap: the ledger is a flat map, never a
//! database transaction.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::db::repository::{RepositoryResult, ResearcherRepository, VisitRepository};
use crate::models::{
    AvailabilityPattern, AvailabilityWeek, DayPart, PlanWeek, Researcher, ResearcherId,
    UnavailabilityPeriod, Visit,
};

/// A saved ledger state for rollback.
pub type LedgerSnapshot = HashMap<(ResearcherId, DayPart), u32>;

/// Remaining assignable slots per (researcher, day-part) for one week.
#[derive(Debug, Clone)]
pub struct CapacityLedger {
    week: PlanWeek,
    remaining: HashMap<(ResearcherId, DayPart), u32>,
}

impl CapacityLedger {
    /// Build a ledger from already-loaded records.
    ///
    /// Base capacity per researcher and day-part is the manual week
    /// override when one exists, otherwise the availability pattern
    /// covering the week's Monday. Slots consumed by overlapping
    /// unavailability days and by visits already committed to this week
    /// are subtracted, flooring at zero.
    pub fn from_parts(
        week: PlanWeek,
        researchers: &[Researcher],
        overrides: &[AvailabilityWeek],
        patterns: &[AvailabilityPattern],
        unavailability: &[UnavailabilityPeriod],
        committed: &[Visit],
    ) -> Self {
        let monday = week.monday();
        let friday = week.friday();
        let mut remaining = HashMap::new();

        for researcher in researchers {
            let week_override = overrides.iter().find(|o| o.researcher_id == researcher.id);
            let pattern = patterns
                .iter()
                .find(|p| p.researcher_id == researcher.id && p.covers(monday));

            for day_part in DayPart::ALL {
                let base = match (week_override, pattern) {
                    (Some(entry), _) => entry.slots(day_part),
                    (None, Some(pattern)) => pattern.weekly_slots(day_part),
                    (None, None) => 0,
                };
                let blocked = unavailability
                    .iter()
                    .filter(|p| p.researcher_id == researcher.id && p.blocks(day_part))
                    .map(|p| overlap_weekdays(p.start_date, p.end_date, monday, friday))
                    .sum::<u32>();
                remaining.insert(
                    (researcher.id, day_part),
                    base.saturating_sub(blocked),
                );
            }
        }

        for visit in committed {
            if visit.planned_week != Some(week) {
                continue;
            }
            let Some(day_part) = visit.day_part else {
                continue;
            };
            for researcher_id in &visit.researcher_ids {
                if let Some(slots) = remaining.get_mut(&(*researcher_id, day_part)) {
                    *slots = slots.saturating_sub(1);
                }
            }
        }

        CapacityLedger { week, remaining }
    }

    /// Load everything the ledger needs and build it.
    pub async fn build<R>(repo: &R, week: PlanWeek) -> RepositoryResult<Self>
    where
        R: ResearcherRepository + VisitRepository + ?Sized,
    {
        let researchers = repo.all_researchers().await?;
        let overrides = repo.availability_weeks(week).await?;
        let patterns = repo.all_patterns().await?;
        let unavailability = repo.all_unavailability().await?;
        let committed = repo
            .visits_overlapping(week.monday(), week.friday())
            .await?;
        Ok(Self::from_parts(
            week,
            &researchers,
            &overrides,
            &patterns,
            &unavailability,
            &committed,
        ))
    }

    pub fn week(&self) -> PlanWeek {
        self.week
    }

    pub fn remaining(&self, researcher_id: ResearcherId, day_part: DayPart) -> u32 {
        self.remaining
            .get(&(researcher_id, day_part))
            .copied()
            .unwrap_or(0)
    }

    /// Consume one slot. Returns false (and changes nothing) when none
    /// are left.
    pub fn reserve(&mut self, researcher_id: ResearcherId, day_part: DayPart) -> bool {
        match self.remaining.get_mut(&(researcher_id, day_part)) {
            Some(slots) if *slots > 0 => {
                *slots -= 1;
                true
            }
            _ => false,
        }
    }

    /// Give a reserved slot back.
    pub fn release(&mut self, researcher_id: ResearcherId, day_part: DayPart) {
        *self
            .remaining
            .entry((researcher_id, day_part))
            .or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.remaining.clone()
    }

    pub fn restore(&mut self, snapshot: LedgerSnapshot) {
        self.remaining = snapshot;
    }
}

/// Number of weekdays of `[start, end]` that fall inside `[monday, friday]`.
fn overlap_weekdays(start: NaiveDate, end: NaiveDate, monday: NaiveDate, friday: NaiveDate) -> u32 {
    let from = start.max(monday);
    let to = end.min(friday);
    if from > to {
        return 0;
    }
    // The clamped range sits inside one Monday-Friday span, so every day
    // in it is a weekday.
    (to - from + Duration::days(1)).num_days() as u32
}
