//! The weekly assignment engine.
//!
//! One run plans a single ISO week: gather eligible open visits, drop
//! protocol/cluster pairs the lookback blocks, staff visits in a
//! deterministic order against the capacity ledger, fix lookahead
//! spacing violations, and persist the whole outcome atomically.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::{AssignmentStrategy, PlannerConfig};
use crate::db::repository::{
    FullRepository, PlanMutation, RepositoryError, StaffedVisit,
};
use crate::models::{
    Catalog, ClusterId, DayPart, PlanWeek, ProtocolId, Researcher, ResearcherId, Visit, VisitId,
    VisitStatus,
};
use crate::services::capacity::CapacityLedger;
use crate::services::frequency::{blocked_pairs, lookahead_violations};
use crate::services::qualification::qualifies;
use crate::services::status::resolve_statuses;

/// Errors from a planning run.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What one planning round did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOutcome {
    pub planned: Vec<VisitId>,
    /// Candidates that could not be fully staffed.
    pub unplanned: Vec<VisitId>,
    /// Candidates excluded before staffing (no day-part, lookback block).
    pub skipped: Vec<VisitId>,
    /// Future visits un-staffed by the lookahead correction.
    pub unstaffed: Vec<VisitId>,
}

/// A staffing decision not yet persisted.
#[derive(Debug, Clone)]
struct Tentative {
    visit_index: usize,
    researchers: Vec<ResearcherId>,
}

/// Plan the given week.
///
/// `today` anchors status derivation and belongs to the caller so runs
/// are reproducible. The returned outcome has been persisted; a storage
/// failure aborts with nothing written.
pub async fn run(
    repo: &dyn FullRepository,
    week: PlanWeek,
    today: NaiveDate,
    config: &PlannerConfig,
) -> Result<PlanOutcome, PlannerError> {
    let monday = week.monday();
    let friday = week.friday();
    info!(%week, %today, "starting weekly planning run");

    let catalog = repo.load_catalog().await?;
    let overlapping = repo.visits_overlapping(monday, friday).await?;
    let statuses = resolve_statuses(repo, &overlapping, today).await?;

    let mut outcome = PlanOutcome::default();

    // Step 1: eligibility.
    let mut candidates: Vec<Visit> = Vec::new();
    for visit in overlapping {
        if visit.planning_locked {
            continue;
        }
        if is_quote_project(&catalog, visit.cluster_id) {
            continue;
        }
        if statuses.get(&visit.id) != Some(&VisitStatus::Open) {
            continue;
        }
        if visit.day_part.is_none() {
            warn!(visit_id = visit.id.value(), "open visit has no day-part, skipping");
            outcome.skipped.push(visit.id);
            continue;
        }
        candidates.push(visit);
    }

    // Step 2: lookback exclusion. Custom visits bypass frequency logic.
    let cluster_ids: Vec<ClusterId> = {
        let mut ids: Vec<ClusterId> = candidates.iter().map(|v| v.cluster_id).collect();
        ids.sort();
        ids.dedup();
        ids
    };
    let history = repo.visits_of_clusters(&cluster_ids).await?;
    let blocked = blocked_pairs(&catalog, &history, week);
    candidates.retain(|visit| {
        if visit.is_custom() {
            return true;
        }
        let hit = catalog
            .protocols_of_windows(&visit.window_ids)
            .into_iter()
            .any(|protocol_id| blocked.contains(&(visit.cluster_id, protocol_id)));
        if hit {
            debug!(visit_id = visit.id.value(), "excluded by lookback spacing");
            outcome.skipped.push(visit.id);
        }
        !hit
    });

    // Step 3: deterministic order.
    candidates.sort_by(|a, b| order_key(&catalog, a).cmp(&order_key(&catalog, b)));

    // Steps 4-5: staffing.
    let mut researchers = repo.all_researchers().await?;
    researchers.sort_by_key(|r| r.id);
    let mut ledger = CapacityLedger::build(repo, week).await?;
    let deadline = Instant::now() + config.time_budget;

    // Greedy pass in rank order.
    let mut tentative: Vec<Tentative> = Vec::new();
    let mut load: HashMap<ResearcherId, u32> = HashMap::new();
    let mut failed: Vec<usize> = Vec::new();

    for (index, visit) in candidates.iter().enumerate() {
        match try_staff(visit, &researchers, &catalog, &mut ledger, &mut load) {
            Some(assigned) => tentative.push(Tentative {
                visit_index: index,
                researchers: assigned,
            }),
            None => failed.push(index),
        }
    }

    // Repair pass: trade staffed non-priority visits for failed priority
    // ones, within the time budget.
    if config.strategy == AssignmentStrategy::Backtracking {
        for &index in &failed {
            if !candidates[index].priority {
                continue;
            }
            if Instant::now() >= deadline {
                debug!("time budget exhausted, keeping assignment set found so far");
                break;
            }
            swap_for_priority(
                index,
                &candidates,
                &researchers,
                &catalog,
                &mut ledger,
                &mut load,
                &mut tentative,
                deadline,
            );
        }
    }

    let staffed_indices: HashSet<usize> = tentative.iter().map(|t| t.visit_index).collect();
    for (index, visit) in candidates.iter().enumerate() {
        if !staffed_indices.contains(&index) {
            outcome.unplanned.push(visit.id);
        }
    }

    // Step 6: lookahead correction for the protocols just committed.
    let mut touched: Vec<ProtocolId> = tentative
        .iter()
        .map(|t| &candidates[t.visit_index])
        .filter(|v| !v.is_custom())
        .flat_map(|v| catalog.protocols_of_windows(&v.window_ids))
        .collect();
    touched.sort();
    touched.dedup();
    outcome.unstaffed =
        lookahead_violations(repo, &catalog, week, &touched, config.lookahead_weeks).await?;

    // Step 7: one atomic write.
    tentative.sort_by_key(|t| candidates[t.visit_index].id);
    let mutation = PlanMutation {
        week,
        staffed: tentative
            .iter()
            .map(|t| StaffedVisit {
                visit_id: candidates[t.visit_index].id,
                researcher_ids: t.researchers.clone(),
            })
            .collect(),
        unstaffed: outcome.unstaffed.clone(),
    };
    if !mutation.is_empty() {
        repo.apply_plan(&mutation).await?;
    }

    outcome.planned = mutation.staffed.iter().map(|s| s.visit_id).collect();
    outcome.unplanned.sort();
    outcome.skipped.sort();
    info!(
        %week,
        planned = outcome.planned.len(),
        unplanned = outcome.unplanned.len(),
        skipped = outcome.skipped.len(),
        unstaffed = outcome.unstaffed.len(),
        "weekly planning run finished"
    );
    Ok(outcome)
}

fn is_quote_project(catalog: &Catalog, cluster_id: ClusterId) -> bool {
    catalog
        .cluster(cluster_id)
        .and_then(|c| catalog.project(c.project_id))
        .map(|p| p.quote)
        .unwrap_or(false)
}

/// Ordering: priority first, then earliest window start, then project
/// code, cluster number, sequence number, id.
fn order_key(catalog: &Catalog, visit: &Visit) -> (bool, NaiveDate, String, u32, u32, i64) {
    let cluster = catalog.cluster(visit.cluster_id);
    let project_code = cluster
        .and_then(|c| catalog.project(c.project_id))
        .map(|p| p.code.clone())
        .unwrap_or_default();
    (
        !visit.priority,
        visit.from_date.unwrap_or(NaiveDate::MAX),
        project_code,
        cluster.map(|c| c.cluster_number).unwrap_or(u32::MAX),
        visit.visit_nr.unwrap_or(u32::MAX),
        visit.id.value(),
    )
}

/// All-or-nothing staffing attempt. Reserves ledger slots only when the
/// full complement is available.
fn try_staff(
    visit: &Visit,
    researchers: &[Researcher],
    catalog: &Catalog,
    ledger: &mut CapacityLedger,
    load: &mut HashMap<ResearcherId, u32>,
) -> Option<Vec<ResearcherId>> {
    let day_part = visit.day_part?;
    let need = visit.required_researchers as usize;
    if need == 0 {
        return None;
    }

    let mut eligible: Vec<ResearcherId> = researchers
        .iter()
        .filter(|r| qualifies(r, visit, catalog))
        .filter(|r| ledger.remaining(r.id, day_part) > 0)
        .map(|r| r.id)
        .collect();
    if eligible.len() < need {
        return None;
    }
    // Spread work: fewest tentative assignments this run first, id as
    // the tie-break.
    eligible.sort_by_key(|id| (load.get(id).copied().unwrap_or(0), *id));
    let chosen: Vec<ResearcherId> = eligible.into_iter().take(need).collect();
    for id in &chosen {
        ledger.reserve(*id, day_part);
        *load.entry(*id).or_insert(0) += 1;
    }
    Some(chosen)
}

fn unstaff(
    tentative: &Tentative,
    day_part: DayPart,
    ledger: &mut CapacityLedger,
    load: &mut HashMap<ResearcherId, u32>,
) {
    for id in &tentative.researchers {
        ledger.release(*id, day_part);
        if let Some(count) = load.get_mut(id) {
            *count = count.saturating_sub(1);
        }
    }
}

/// Speculative repair for an unstaffable priority visit.
///
/// Each tentative assignment is tried as a victim: roll it back, staff
/// the priority visit, then re-staff the victim's visit with whatever
/// researchers remain. The trade is kept when it strictly improves the
/// (priority staffed, total staffed) count: the victim found an
/// alternative combination, or the victim was non-priority and drops to
/// unplanned. Everything else is rolled back. Bounded by `deadline`.
#[allow(clippy::too_many_arguments)]
fn swap_for_priority(
    priority_index: usize,
    candidates: &[Visit],
    researchers: &[Researcher],
    catalog: &Catalog,
    ledger: &mut CapacityLedger,
    load: &mut HashMap<ResearcherId, u32>,
    tentative: &mut Vec<Tentative>,
    deadline: Instant,
) -> bool {
    let priority_visit = &candidates[priority_index];

    for victim_position in (0..tentative.len()).rev() {
        if Instant::now() >= deadline {
            debug!("time budget exhausted, keeping best assignment set found");
            return false;
        }
        let victim = tentative[victim_position].clone();
        let victim_visit = &candidates[victim.visit_index];
        let Some(victim_day_part) = victim_visit.day_part else {
            continue;
        };

        let saved_ledger = ledger.snapshot();
        let saved_load = load.clone();
        unstaff(&victim, victim_day_part, ledger, load);

        if let Some(assigned) = try_staff(priority_visit, researchers, catalog, ledger, load) {
            let restored = try_staff(victim_visit, researchers, catalog, ledger, load);
            if restored.is_some() || !victim_visit.priority {
                tentative.remove(victim_position);
                tentative.push(Tentative {
                    visit_index: priority_index,
                    researchers: assigned,
                });
                match restored {
                    Some(combination) => {
                        debug!(
                            reassigned = victim_visit.id.value(),
                            staffed = priority_visit.id.value(),
                            "found an alternative researcher combination"
                        );
                        tentative.push(Tentative {
                            visit_index: victim.visit_index,
                            researchers: combination,
                        });
                    }
                    None => {
                        debug!(
                            displaced = victim_visit.id.value(),
                            staffed = priority_visit.id.value(),
                            "traded a non-priority assignment for a priority visit"
                        );
                    }
                }
                return true;
            }
        }

        ledger.restore(saved_ledger);
        *load = saved_load;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cluster, Project, ProjectId};

    fn catalog_with_project(code: &str) -> Catalog {
        Catalog::new(
            vec![],
            vec![],
            vec![],
            vec![],
            vec![Cluster {
                id: ClusterId::new(1),
                project_id: ProjectId::new(1),
                cluster_number: 3,
                name: "north".into(),
            }],
            vec![Project {
                id: ProjectId::new(1),
                code: code.into(),
                quote: false,
            }],
        )
    }

    fn visit(id: i64, priority: bool, from: Option<NaiveDate>) -> Visit {
        Visit {
            id: VisitId::new(id),
            cluster_id: ClusterId::new(1),
            visit_nr: Some(1),
            from_date: from,
            to_date: from,
            day_part: Some(DayPart::Morning),
            required_researchers: 1,
            priority,
            logistics: Default::default(),
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
    fn test_priority_sorts_first() {
        let catalog = catalog_with_project("P-01");
        let day = NaiveDate::from_ymd_opt(2026, 5, 11);
        let normal = visit(1, false, day);
        let priority = visit(2, true, day);
        assert!(order_key(&catalog, &priority) < order_key(&catalog, &normal));
    }

    #[test]
    fn test_missing_from_date_sorts_last() {
        let catalog = catalog_with_project("P-01");
        let dated = visit(1, false, NaiveDate::from_ymd_opt(2026, 5, 11));
        let undated = visit(2, false, None);
        assert!(order_key(&catalog, &dated) < order_key(&catalog, &undated));
    }
}
