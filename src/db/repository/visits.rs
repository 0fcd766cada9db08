//! Visit repository trait: reads for the planning pipeline and the
//! atomic plan mutation.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::RepositoryResult;
use crate::models::{
    ClusterId, PlanWeek, ProtocolId, ResearcherId, Visit, VisitId, WindowId,
};

/// One visit's staffing decision inside a plan mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffedVisit {
    pub visit_id: VisitId,
    pub researcher_ids: Vec<ResearcherId>,
}

/// The complete outcome of one weekly planning round, applied atomically.
///
/// `staffed` entries get their researcher links replaced and their
/// planned week set to `week`; `unstaffed` entries get researcher links
/// and planned week cleared (lookahead corrections).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMutation {
    pub week: PlanWeek,
    pub staffed: Vec<StaffedVisit>,
    pub unstaffed: Vec<VisitId>,
}

impl PlanMutation {
    pub fn is_empty(&self) -> bool {
        self.staffed.is_empty() && self.unstaffed.is_empty()
    }
}

/// Repository trait for visit reads and planning writes.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Get a single visit by ID, relation ids populated.
    ///
    /// # Returns
    /// * `Ok(Visit)` - The visit
    /// * `Err(RepositoryError::NotFound)` - If the visit doesn't exist
    async fn get_visit(&self, visit_id: VisitId) -> RepositoryResult<Visit>;

    /// All visits whose date window overlaps `[start, end]`.
    ///
    /// # Arguments
    /// * `start` / `end` - Inclusive date range, typically a work week
    async fn visits_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Visit>>;

    /// All visits of the given clusters, for lookback scans and index
    /// backfill. Order is unspecified; callers sort.
    async fn visits_of_clusters(&self, cluster_ids: &[ClusterId]) -> RepositoryResult<Vec<Visit>>;

    /// Locked (researcher-assigned) future visits linked to any of the
    /// given protocols with `from_date` inside `[start, end]`. Used by
    /// the lookahead scan.
    async fn locked_visits_for_protocols(
        &self,
        protocol_ids: &[ProtocolId],
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Visit>>;

    /// Apply one planning round's staffing and un-staffing decisions as a
    /// single all-or-nothing mutation.
    ///
    /// # Returns
    /// * `Err(RepositoryError::TransactionError)` - Nothing was written
    async fn apply_plan(&self, mutation: &PlanMutation) -> RepositoryResult<()>;

    /// Link visits to protocol windows, inserting only links that are
    /// missing. Existing links are never removed.
    async fn add_window_links(&self, links: &[(VisitId, WindowId)]) -> RepositoryResult<usize>;

    /// Replace a visit's researcher set wholesale.
    async fn replace_researchers(
        &self,
        visit_id: VisitId,
        researcher_ids: &[ResearcherId],
    ) -> RepositoryResult<()>;
}
