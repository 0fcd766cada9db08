//! Availability administration.
//!
//! Creation and update of availability patterns and unavailability
//! periods, with synchronous overlap rejection: one researcher's ranges
//! of the same kind may never overlap, and a rejection names the
//! conflicting existing range.

use chrono::NaiveDate;

use crate::db::repository::{RepositoryError, ResearcherRepository};
use crate::models::{
    AvailabilityPattern, AvailabilityWeek, DayPart, PlanWeek, ResearcherId, UnavailabilityPeriod,
};

/// Errors from availability administration.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    /// The submitted range collides with an existing one.
    #[error("range overlaps an existing entry from {start} to {end}")]
    Overlap { start: NaiveDate, end: NaiveDate },

    #[error("end date {end} precedes start date {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), AvailabilityError> {
    if end < start {
        return Err(AvailabilityError::InvertedRange { start, end });
    }
    Ok(())
}

/// Two inclusive ranges overlap iff each starts no later than the other
/// ends.
fn ranges_overlap(
    start_a: NaiveDate,
    end_a: NaiveDate,
    start_b: NaiveDate,
    end_b: NaiveDate,
) -> bool {
    start_a <= end_b && end_a >= start_b
}

fn find_conflict<'a, I>(
    existing: I,
    start: NaiveDate,
    end: NaiveDate,
    exclude_id: Option<i64>,
) -> Option<(NaiveDate, NaiveDate)>
where
    I: IntoIterator<Item = (i64, NaiveDate, NaiveDate)>,
{
    existing.into_iter().find_map(|(id, s, e)| {
        if Some(id) == exclude_id {
            return None;
        }
        ranges_overlap(start, end, s, e).then_some((s, e))
    })
}

/// Create an availability pattern, rejecting overlaps with the
/// researcher's existing patterns.
pub async fn create_pattern(
    repo: &(impl ResearcherRepository + ?Sized),
    pattern: AvailabilityPattern,
) -> Result<i64, AvailabilityError> {
    check_range(pattern.start_date, pattern.end_date)?;
    let existing = repo.patterns_for_researcher(pattern.researcher_id).await?;
    if let Some((start, end)) = find_conflict(
        existing.iter().map(|p| (p.id, p.start_date, p.end_date)),
        pattern.start_date,
        pattern.end_date,
        None,
    ) {
        return Err(AvailabilityError::Overlap { start, end });
    }
    Ok(repo.insert_pattern(&pattern).await?)
}

/// Update a pattern in place, ignoring the pattern's own stored range in
/// the overlap check.
pub async fn update_pattern(
    repo: &(impl ResearcherRepository + ?Sized),
    pattern: AvailabilityPattern,
) -> Result<(), AvailabilityError> {
    check_range(pattern.start_date, pattern.end_date)?;
    let existing = repo.patterns_for_researcher(pattern.researcher_id).await?;
    if let Some((start, end)) = find_conflict(
        existing.iter().map(|p| (p.id, p.start_date, p.end_date)),
        pattern.start_date,
        pattern.end_date,
        Some(pattern.id),
    ) {
        return Err(AvailabilityError::Overlap { start, end });
    }
    repo.update_pattern(&pattern).await?;
    Ok(())
}

/// Create an unavailability period, rejecting overlaps with the
/// researcher's existing periods.
pub async fn create_unavailability(
    repo: &(impl ResearcherRepository + ?Sized),
    period: UnavailabilityPeriod,
) -> Result<i64, AvailabilityError> {
    check_range(period.start_date, period.end_date)?;
    let existing = repo
        .unavailability_for_researcher(period.researcher_id)
        .await?;
    if let Some((start, end)) = find_conflict(
        existing.iter().map(|p| (p.id, p.start_date, p.end_date)),
        period.start_date,
        period.end_date,
        None,
    ) {
        return Err(AvailabilityError::Overlap { start, end });
    }
    Ok(repo.insert_unavailability(&period).await?)
}

/// Update an unavailability period in place.
pub async fn update_unavailability(
    repo: &(impl ResearcherRepository + ?Sized),
    period: UnavailabilityPeriod,
) -> Result<(), AvailabilityError> {
    check_range(period.start_date, period.end_date)?;
    let existing = repo
        .unavailability_for_researcher(period.researcher_id)
        .await?;
    if let Some((start, end)) = find_conflict(
        existing.iter().map(|p| (p.id, p.start_date, p.end_date)),
        period.start_date,
        period.end_date,
        Some(period.id),
    ) {
        return Err(AvailabilityError::Overlap { start, end });
    }
    repo.update_unavailability(&period).await?;
    Ok(())
}

/// Set one day-part cell of a researcher's manual week override,
/// creating the row when absent.
pub async fn set_week_slots(
    repo: &(impl ResearcherRepository + ?Sized),
    researcher_id: ResearcherId,
    week: PlanWeek,
    day_part: DayPart,
    slots: u32,
) -> Result<(), AvailabilityError> {
    let rows = repo.availability_weeks(week).await?;
    let mut entry = rows
        .into_iter()
        .find(|row| row.researcher_id == researcher_id)
        .unwrap_or(AvailabilityWeek {
            researcher_id,
            week,
            morning_slots: 0,
            daytime_slots: 0,
            evening_slots: 0,
        });
    entry.set_slots(day_part, slots);
    repo.upsert_availability_week(&entry).await?;
    Ok(())
}
