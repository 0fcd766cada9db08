//! Visit status derivation.
//!
//! Status is never stored; it is derived on demand from the visit's
//! fields and its most recent status-bearing activity event. An explicit
//! lifecycle event always wins over field inference.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::db::repository::{ActivityLogRepository, RepositoryResult};
use crate::models::{ActivityEvent, LifecycleAction, PlanWeek, Visit, VisitId, VisitStatus};

/// Derive a visit's status from its fields and latest lifecycle event.
///
/// Precedence:
/// 1. An explicit lifecycle event pins the status. A `visit_status_cleared`
///    event withdraws earlier pins and falls through to field inference,
///    as does an unrecognized action (logged, never fatal).
/// 2. No date window yet: `Created`.
/// 3. Window end in the past: `Overdue`.
/// 4. Researchers committed and a planned week set: `Planned`, or
///    `Missed` when the planned week already lies behind today's week.
/// 5. Otherwise: `Open`.
pub fn derive_visit_status(
    visit: &Visit,
    latest_event: Option<&ActivityEvent>,
    today: NaiveDate,
) -> VisitStatus {
    if let Some(event) = latest_event {
        match LifecycleAction::parse(&event.action) {
            Some(action) => {
                if let Some(status) = action.pinned_status() {
                    return status;
                }
                // StatusCleared: fall through to field inference.
            }
            None => {
                warn!(
                    visit_id = visit.id.value(),
                    action = %event.action,
                    "unrecognized lifecycle action, falling back to field inference"
                );
            }
        }
    }

    let (_, to_date) = match (visit.from_date, visit.to_date) {
        (Some(from), Some(to)) => (from, to),
        _ => return VisitStatus::Created,
    };

    if to_date < today {
        return VisitStatus::Overdue;
    }

    if visit.is_locked() {
        if let Some(planned) = visit.planned_week {
            return if planned < PlanWeek::from_date(today) {
                VisitStatus::Missed
            } else {
                VisitStatus::Planned
            };
        }
    }

    VisitStatus::Open
}

/// Resolve statuses for a batch of visits in one log query.
pub async fn resolve_statuses(
    repo: &(impl ActivityLogRepository + ?Sized),
    visits: &[Visit],
    today: NaiveDate,
) -> RepositoryResult<HashMap<VisitId, VisitStatus>> {
    let ids: Vec<VisitId> = visits.iter().map(|v| v.id).collect();
    let events = repo.latest_lifecycle_events(&ids).await?;
    Ok(visits
        .iter()
        .map(|v| (v.id, derive_visit_status(v, events.get(&v.id), today)))
        .collect())
}
