//! Activity log repository trait: append-only audit events.

use async_trait::async_trait;
use std::collections::HashMap;

use super::error::RepositoryResult;
use crate::models::{ActivityEvent, EventId, VisitId};

/// Repository trait for the append-only activity log.
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// Append one event, assigning its id and timestamp ordering.
    async fn append_event(&self, event: ActivityEvent) -> RepositoryResult<EventId>;

    /// The most recent status-bearing lifecycle event per visit, for the
    /// given visits. Visits without such an event are absent from the map.
    ///
    /// Implementations resolve ties on equal timestamps by highest event
    /// id, matching a max-timestamp grouped query.
    async fn latest_lifecycle_events(
        &self,
        visit_ids: &[VisitId],
    ) -> RepositoryResult<HashMap<VisitId, ActivityEvent>>;

    /// All events for one target, newest first.
    async fn events_for_target(
        &self,
        target_type: &str,
        target_id: i64,
    ) -> RepositoryResult<Vec<ActivityEvent>>;
}
