//! Minimum-spacing enforcement between protocol visits.
//!
//! Both directions share one rule: the gap in calendar days between a
//! reference end date and a candidate start date must reach the
//! protocol's minimum spacing. Lookback blocks candidates before they
//! are staffed; lookahead un-staffs future visits a fresh commitment has
//! pushed too close.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::db::repository::{RepositoryResult, VisitRepository};
use crate::models::{Catalog, ClusterId, MinSpacing, PlanWeek, ProtocolId, Visit, VisitId};

/// True when `gap_days` falls short of the spacing requirement.
pub fn spacing_violated(gap_days: i64, spacing: MinSpacing) -> bool {
    gap_days < spacing.required_gap_days()
}

/// The date a locked visit's spacing is measured from: the Friday of its
/// planned week when planned, else its window end.
fn reference_end(visit: &Visit) -> Option<NaiveDate> {
    visit
        .planned_week
        .map(|week| week.friday())
        .or(visit.to_date)
}

/// Lookback: (cluster, protocol) pairs whose most recent locked visit
/// sits too close to the target week's Monday.
///
/// A blocked pair excludes every candidate of that protocol in that
/// cluster for the round. `cluster_visits` is the full visit history of
/// the clusters under consideration.
pub fn blocked_pairs(
    catalog: &Catalog,
    cluster_visits: &[Visit],
    target_week: PlanWeek,
) -> HashSet<(ClusterId, ProtocolId)> {
    let candidate_start = target_week.monday();

    // Most recent reference end per (cluster, protocol), locked visits only.
    let mut latest: HashMap<(ClusterId, ProtocolId), NaiveDate> = HashMap::new();
    for visit in cluster_visits {
        if !visit.is_locked() || visit.is_custom() {
            continue;
        }
        let Some(end) = reference_end(visit) else {
            continue;
        };
        if end >= candidate_start {
            // Not history; same-week and future visits are the
            // lookahead's concern.
            continue;
        }
        for protocol_id in catalog.protocols_of_windows(&visit.window_ids) {
            let key = (visit.cluster_id, protocol_id);
            let entry = latest.entry(key).or_insert(end);
            if end > *entry {
                *entry = end;
            }
        }
    }

    let mut blocked = HashSet::new();
    for ((cluster_id, protocol_id), end) in latest {
        let Some(spacing) = catalog.protocol(protocol_id).and_then(|p| p.min_spacing) else {
            continue;
        };
        let gap = (candidate_start - end).num_days();
        if spacing_violated(gap, spacing) {
            debug!(
                cluster_id = cluster_id.value(),
                protocol_id = protocol_id.value(),
                gap_days = gap,
                required_days = spacing.required_gap_days(),
                "protocol blocked for cluster this round"
            );
            blocked.insert((cluster_id, protocol_id));
        }
    }
    blocked
}

/// Lookahead: future locked visits of the touched protocols that now sit
/// too close behind the run week.
///
/// The gap runs from the run week's Friday to the future visit's window
/// start. The scan is bounded by `horizon_weeks`; `planning_locked`
/// visits are never touched. Returns the visits to un-staff.
pub async fn lookahead_violations(
    repo: &(impl VisitRepository + ?Sized),
    catalog: &Catalog,
    run_week: PlanWeek,
    touched_protocols: &[ProtocolId],
    horizon_weeks: u32,
) -> RepositoryResult<Vec<VisitId>> {
    if touched_protocols.is_empty() {
        return Ok(Vec::new());
    }
    let run_end = run_week.friday();
    let scan_from = run_end + Duration::days(1);
    let scan_to = run_end + Duration::days(7 * horizon_weeks as i64);
    let future = repo
        .locked_visits_for_protocols(touched_protocols, scan_from, scan_to)
        .await?;

    let mut violations = Vec::new();
    for visit in future {
        if visit.planning_locked || visit.is_custom() {
            continue;
        }
        let Some(from) = visit.from_date else {
            continue;
        };
        let gap = (from - run_end).num_days();
        let violated = catalog
            .protocols_of_windows(&visit.window_ids)
            .into_iter()
            .filter(|p| touched_protocols.contains(p))
            .filter_map(|p| catalog.protocol(p).and_then(|p| p.min_spacing))
            .any(|spacing| spacing_violated(gap, spacing));
        if violated {
            info!(
                visit_id = visit.id.value(),
                gap_days = gap,
                "future visit violates minimum spacing, un-staffing"
            );
            violations.push(visit.id);
        }
    }
    violations.sort();
    Ok(violations)
}
