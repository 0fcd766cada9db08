//! Protocol-window backfill for visits.
//!
//! Historical data contains visits without links to their protocol
//! visit windows. This service walks each cluster's visits in sequence
//! order, counts per-(function, species) occurrences, and links every
//! visit to the window matching its position. Only missing links are
//! inserted, so the walk is idempotent.

use std::collections::HashMap;

use tracing::info;

use crate::db::repository::{CatalogRepository, RepositoryResult, VisitRepository};
use crate::models::{Catalog, ClusterId, FunctionId, SpeciesId, Visit, VisitId, WindowId};

/// Counters describing one backfill pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillSummary {
    pub visits_checked: usize,
    pub links_added: usize,
    pub skipped_custom: usize,
    pub skipped_no_visit_nr: usize,
    pub skipped_no_relations: usize,
    pub skipped_no_protocol: usize,
}

/// Backfill window links for the given clusters.
///
/// Data-shape gaps (custom visits, missing sequence numbers, missing
/// relations, pairs without a registered protocol or window) are counted
/// and skipped, never errors.
pub async fn backfill_window_links<R>(
    repo: &R,
    cluster_ids: &[ClusterId],
) -> RepositoryResult<BackfillSummary>
where
    R: VisitRepository + CatalogRepository + ?Sized,
{
    let catalog = repo.load_catalog().await?;
    let visits = repo.visits_of_clusters(cluster_ids).await?;

    let mut by_cluster: HashMap<ClusterId, Vec<&Visit>> = HashMap::new();
    for visit in &visits {
        by_cluster.entry(visit.cluster_id).or_default().push(visit);
    }

    let mut summary = BackfillSummary::default();
    let mut links: Vec<(VisitId, WindowId)> = Vec::new();

    let mut cluster_ids: Vec<ClusterId> = by_cluster.keys().copied().collect();
    cluster_ids.sort();
    for cluster_id in cluster_ids {
        let mut cluster_visits = by_cluster.remove(&cluster_id).unwrap_or_default();
        cluster_visits.sort_by_key(|v| (v.visit_nr, v.id));

        // Occurrence count per (function, species) pair within the cluster.
        let mut occurrences: HashMap<(FunctionId, SpeciesId), u32> = HashMap::new();

        for visit in cluster_visits {
            summary.visits_checked += 1;
            if visit.is_custom() {
                summary.skipped_custom += 1;
                continue;
            }
            if visit.visit_nr.is_none() {
                summary.skipped_no_visit_nr += 1;
                continue;
            }
            if visit.function_ids.is_empty() || visit.species_ids.is_empty() {
                summary.skipped_no_relations += 1;
                continue;
            }

            for function_id in &visit.function_ids {
                for species_id in &visit.species_ids {
                    let counter = occurrences
                        .entry((*function_id, *species_id))
                        .or_insert(0);
                    *counter += 1;
                    let visit_index = *counter;

                    match resolve_window(&catalog, *function_id, *species_id, visit_index) {
                        Some(window_id) => {
                            if !visit.window_ids.contains(&window_id) {
                                links.push((visit.id, window_id));
                            }
                        }
                        None => summary.skipped_no_protocol += 1,
                    }
                }
            }
        }
    }

    summary.links_added = repo.add_window_links(&links).await?;
    info!(
        visits_checked = summary.visits_checked,
        links_added = summary.links_added,
        skipped_custom = summary.skipped_custom,
        skipped_no_visit_nr = summary.skipped_no_visit_nr,
        skipped_no_relations = summary.skipped_no_relations,
        skipped_no_protocol = summary.skipped_no_protocol,
        "window backfill pass finished"
    );
    Ok(summary)
}

fn resolve_window(
    catalog: &Catalog,
    function_id: FunctionId,
    species_id: SpeciesId,
    visit_index: u32,
) -> Option<WindowId> {
    let protocol = catalog.protocol_for_pair(function_id, species_id)?;
    catalog
        .window_for_index(protocol.id, visit_index)
        .map(|w| w.id)
}
