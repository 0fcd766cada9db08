//! In-memory local repository implementation.
//!
//! Stores everything in `HashMap`s behind a `parking_lot::RwLock`,
//! giving fast, deterministic, isolated execution for unit tests and
//! local development. Writes that touch several entities take the write
//! lock once, which is what makes `apply_plan` atomic here.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repository::{
    ActivityLogRepository, CatalogRepository, ErrorContext, PlanMutation, RepositoryError,
    RepositoryResult, ResearcherRepository, VisitRepository,
};
use crate::models::{
    ActivityEvent, AvailabilityPattern, AvailabilityWeek, Cluster, ClusterId, EventId,
    PlanWeek, Project, ProjectId, Protocol, ProtocolId, ProtocolVisitWindow, Researcher,
    ResearcherId, Species, SpeciesId, SurveyFunction, FunctionId, UnavailabilityPeriod, Visit,
    VisitId, WindowId,
};

/// In-memory local repository.
///
/// Cloning is cheap; clones share the same underlying store.
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    visits: HashMap<VisitId, Visit>,

    // Reference data
    species: HashMap<SpeciesId, Species>,
    functions: HashMap<FunctionId, SurveyFunction>,
    protocols: HashMap<ProtocolId, Protocol>,
    windows: HashMap<WindowId, ProtocolVisitWindow>,
    clusters: HashMap<ClusterId, Cluster>,
    projects: HashMap<ProjectId, Project>,

    // People and availability
    researchers: HashMap<ResearcherId, Researcher>,
    availability_weeks: HashMap<(ResearcherId, PlanWeek), AvailabilityWeek>,
    patterns: HashMap<i64, AvailabilityPattern>,
    unavailability: HashMap<i64, UnavailabilityPeriod>,

    // Append-only log
    events: Vec<ActivityEvent>,

    // ID counters
    next_visit_id: i64,
    next_pattern_id: i64,
    next_unavailability_id: i64,
    next_event_id: i64,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            visits: HashMap::new(),
            species: HashMap::new(),
            functions: HashMap::new(),
            protocols: HashMap::new(),
            windows: HashMap::new(),
            clusters: HashMap::new(),
            projects: HashMap::new(),
            researchers: HashMap::new(),
            availability_weeks: HashMap::new(),
            patterns: HashMap::new(),
            unavailability: HashMap::new(),
            events: Vec::new(),
            next_visit_id: 1,
            next_pattern_id: 1,
            next_unavailability_id: 1,
            next_event_id: 1,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Seed helpers ====================
    // Reference-data ids come from the caller so fixtures can refer to
    // them; visit/pattern/event ids are assigned here.

    pub fn seed_species(&self, species: Species) {
        self.data.write().species.insert(species.id, species);
    }

    pub fn seed_function(&self, function: SurveyFunction) {
        self.data.write().functions.insert(function.id, function);
    }

    pub fn seed_protocol(&self, protocol: Protocol) {
        self.data.write().protocols.insert(protocol.id, protocol);
    }

    pub fn seed_window(&self, window: ProtocolVisitWindow) {
        self.data.write().windows.insert(window.id, window);
    }

    pub fn seed_cluster(&self, cluster: Cluster) {
        self.data.write().clusters.insert(cluster.id, cluster);
    }

    pub fn seed_project(&self, project: Project) {
        self.data.write().projects.insert(project.id, project);
    }

    pub fn seed_researcher(&self, researcher: Researcher) {
        self.data
            .write()
            .researchers
            .insert(researcher.id, researcher);
    }

    /// Add a visit, assigning its id.
    pub fn add_visit(&self, mut visit: Visit) -> VisitId {
        let mut data = self.data.write();
        let id = VisitId::new(data.next_visit_id);
        data.next_visit_id += 1;
        visit.id = id;
        data.visits.insert(id, visit);
        id
    }

    /// Number of visits stored.
    pub fn visit_count(&self) -> usize {
        self.data.read().visits.len()
    }
}

#[async_trait]
impl VisitRepository for LocalRepository {
    async fn get_visit(&self, visit_id: VisitId) -> RepositoryResult<Visit> {
        self.data.read().visits.get(&visit_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "visit does not exist",
                ErrorContext::new("get_visit")
                    .with_entity("visit")
                    .with_entity_id(visit_id),
            )
        })
    }

    async fn visits_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Visit>> {
        let data = self.data.read();
        Ok(data
            .visits
            .values()
            .filter(|v| v.window_overlaps(start, end))
            .cloned()
            .collect())
    }

    async fn visits_of_clusters(&self, cluster_ids: &[ClusterId]) -> RepositoryResult<Vec<Visit>> {
        let data = self.data.read();
        Ok(data
            .visits
            .values()
            .filter(|v| cluster_ids.contains(&v.cluster_id))
            .cloned()
            .collect())
    }

    async fn locked_visits_for_protocols(
        &self,
        protocol_ids: &[ProtocolId],
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Visit>> {
        let data = self.data.read();
        let result = data
            .visits
            .values()
            .filter(|v| v.is_locked())
            .filter(|v| {
                v.from_date
                    .map(|from| start <= from && from <= end)
                    .unwrap_or(false)
            })
            .filter(|v| {
                v.window_ids.iter().any(|w| {
                    data.windows
                        .get(w)
                        .map(|window| protocol_ids.contains(&window.protocol_id))
                        .unwrap_or(false)
                })
            })
            .cloned()
            .collect();
        Ok(result)
    }

    async fn apply_plan(&self, mutation: &PlanMutation) -> RepositoryResult<()> {
        let mut data = self.data.write();

        // Validate everything before touching anything so a failure
        // leaves the store unchanged.
        for staffed in &mutation.staffed {
            if !data.visits.contains_key(&staffed.visit_id) {
                return Err(RepositoryError::transaction(format!(
                    "staffed visit {} does not exist",
                    staffed.visit_id
                ))
                .with_operation("apply_plan"));
            }
            for researcher_id in &staffed.researcher_ids {
                if !data.researchers.contains_key(researcher_id) {
                    return Err(RepositoryError::transaction(format!(
                        "researcher {} does not exist",
                        researcher_id
                    ))
                    .with_operation("apply_plan"));
                }
            }
        }
        for visit_id in &mutation.unstaffed {
            if !data.visits.contains_key(visit_id) {
                return Err(RepositoryError::transaction(format!(
                    "unstaffed visit {} does not exist",
                    visit_id
                ))
                .with_operation("apply_plan"));
            }
        }

        for staffed in &mutation.staffed {
            if let Some(visit) = data.visits.get_mut(&staffed.visit_id) {
                visit.researcher_ids = staffed.researcher_ids.clone();
                visit.planned_week = Some(mutation.week);
            }
        }
        for visit_id in &mutation.unstaffed {
            if let Some(visit) = data.visits.get_mut(visit_id) {
                visit.researcher_ids.clear();
                visit.planned_week = None;
            }
        }
        Ok(())
    }

    async fn add_window_links(&self, links: &[(VisitId, WindowId)]) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        let mut added = 0;
        for (visit_id, window_id) in links {
            let visit = data.visits.get_mut(visit_id).ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "visit does not exist",
                    ErrorContext::new("add_window_links")
                        .with_entity("visit")
                        .with_entity_id(visit_id),
                )
            })?;
            if !visit.window_ids.contains(window_id) {
                visit.window_ids.push(*window_id);
                added += 1;
            }
        }
        Ok(added)
    }

    async fn replace_researchers(
        &self,
        visit_id: VisitId,
        researcher_ids: &[ResearcherId],
    ) -> RepositoryResult<()> {
        let mut data = self.data.write();
        let visit = data.visits.get_mut(&visit_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "visit does not exist",
                ErrorContext::new("replace_researchers")
                    .with_entity("visit")
                    .with_entity_id(visit_id),
            )
        })?;
        visit.researcher_ids = researcher_ids.to_vec();
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn all_species(&self) -> RepositoryResult<Vec<Species>> {
        Ok(self.data.read().species.values().cloned().collect())
    }

    async fn all_functions(&self) -> RepositoryResult<Vec<SurveyFunction>> {
        Ok(self.data.read().functions.values().cloned().collect())
    }

    async fn all_protocols(&self) -> RepositoryResult<Vec<Protocol>> {
        Ok(self.data.read().protocols.values().cloned().collect())
    }

    async fn all_windows(&self) -> RepositoryResult<Vec<ProtocolVisitWindow>> {
        Ok(self.data.read().windows.values().cloned().collect())
    }

    async fn all_clusters(&self) -> RepositoryResult<Vec<Cluster>> {
        Ok(self.data.read().clusters.values().cloned().collect())
    }

    async fn all_projects(&self) -> RepositoryResult<Vec<Project>> {
        Ok(self.data.read().projects.values().cloned().collect())
    }
}

#[async_trait]
impl ResearcherRepository for LocalRepository {
    async fn all_researchers(&self) -> RepositoryResult<Vec<Researcher>> {
        Ok(self.data.read().researchers.values().cloned().collect())
    }

    async fn availability_weeks(&self, week: PlanWeek) -> RepositoryResult<Vec<AvailabilityWeek>> {
        let data = self.data.read();
        Ok(data
            .availability_weeks
            .values()
            .filter(|entry| entry.week == week)
            .cloned()
            .collect())
    }

    async fn upsert_availability_week(&self, entry: &AvailabilityWeek) -> RepositoryResult<()> {
        let mut data = self.data.write();
        data.availability_weeks
            .insert((entry.researcher_id, entry.week), entry.clone());
        Ok(())
    }

    async fn patterns_for_researcher(
        &self,
        researcher_id: ResearcherId,
    ) -> RepositoryResult<Vec<AvailabilityPattern>> {
        let data = self.data.read();
        Ok(data
            .patterns
            .values()
            .filter(|p| p.researcher_id == researcher_id)
            .cloned()
            .collect())
    }

    async fn all_patterns(&self) -> RepositoryResult<Vec<AvailabilityPattern>> {
        Ok(self.data.read().patterns.values().cloned().collect())
    }

    async fn insert_pattern(&self, pattern: &AvailabilityPattern) -> RepositoryResult<i64> {
        let mut data = self.data.write();
        let id = data.next_pattern_id;
        data.next_pattern_id += 1;
        let mut stored = pattern.clone();
        stored.id = id;
        data.patterns.insert(id, stored);
        Ok(id)
    }

    async fn update_pattern(&self, pattern: &AvailabilityPattern) -> RepositoryResult<()> {
        let mut data = self.data.write();
        if !data.patterns.contains_key(&pattern.id) {
            return Err(RepositoryError::not_found_with_context(
                "availability pattern does not exist",
                ErrorContext::new("update_pattern")
                    .with_entity("availability_pattern")
                    .with_entity_id(pattern.id),
            ));
        }
        data.patterns.insert(pattern.id, pattern.clone());
        Ok(())
    }

    async fn unavailability_for_researcher(
        &self,
        researcher_id: ResearcherId,
    ) -> RepositoryResult<Vec<UnavailabilityPeriod>> {
        let data = self.data.read();
        Ok(data
            .unavailability
            .values()
            .filter(|p| p.researcher_id == researcher_id)
            .cloned()
            .collect())
    }

    async fn all_unavailability(&self) -> RepositoryResult<Vec<UnavailabilityPeriod>> {
        Ok(self.data.read().unavailability.values().cloned().collect())
    }

    async fn insert_unavailability(
        &self,
        period: &UnavailabilityPeriod,
    ) -> RepositoryResult<i64> {
        let mut data = self.data.write();
        let id = data.next_unavailability_id;
        data.next_unavailability_id += 1;
        let mut stored = period.clone();
        stored.id = id;
        data.unavailability.insert(id, stored);
        Ok(id)
    }

    async fn update_unavailability(&self, period: &UnavailabilityPeriod) -> RepositoryResult<()> {
        let mut data = self.data.write();
        if !data.unavailability.contains_key(&period.id) {
            return Err(RepositoryError::not_found_with_context(
                "unavailability period does not exist",
                ErrorContext::new("update_unavailability")
                    .with_entity("unavailability_period")
                    .with_entity_id(period.id),
            ));
        }
        data.unavailability.insert(period.id, period.clone());
        Ok(())
    }
}

#[async_trait]
impl ActivityLogRepository for LocalRepository {
    async fn append_event(&self, mut event: ActivityEvent) -> RepositoryResult<EventId> {
        let mut data = self.data.write();
        let id = EventId::new(data.next_event_id);
        data.next_event_id += 1;
        event.id = id;
        data.events.push(event);
        Ok(id)
    }

    async fn latest_lifecycle_events(
        &self,
        visit_ids: &[VisitId],
    ) -> RepositoryResult<HashMap<VisitId, ActivityEvent>> {
        use crate::models::LifecycleAction;

        let data = self.data.read();
        let mut latest: HashMap<VisitId, ActivityEvent> = HashMap::new();
        for event in &data.events {
            if event.target_type != "visit" {
                continue;
            }
            if !LifecycleAction::STATUS_ACTIONS.contains(&event.action.as_str()) {
                continue;
            }
            let visit_id = VisitId::new(event.target_id);
            if !visit_ids.contains(&visit_id) {
                continue;
            }
            let replace = match latest.get(&visit_id) {
                Some(current) => {
                    (event.created_at, event.id.value())
                        > (current.created_at, current.id.value())
                }
                None => true,
            };
            if replace {
                latest.insert(visit_id, event.clone());
            }
        }
        Ok(latest)
    }

    async fn events_for_target(
        &self,
        target_type: &str,
        target_id: i64,
    ) -> RepositoryResult<Vec<ActivityEvent>> {
        let data = self.data.read();
        let mut events: Vec<ActivityEvent> = data
            .events
            .iter()
            .filter(|e| e.target_type == target_type && e.target_id == target_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| (b.created_at, b.id.value()).cmp(&(a.created_at, a.id.value())));
        Ok(events)
    }
}
