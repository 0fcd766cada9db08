//! Researcher repository trait: people, qualifications, availability.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    AvailabilityPattern, AvailabilityWeek, PlanWeek, Researcher, ResearcherId,
    UnavailabilityPeriod,
};

/// Repository trait for researcher and availability data.
///
/// Overlap validation of patterns and unavailability periods lives in
/// the availability service; these methods store what they are given.
#[async_trait]
pub trait ResearcherRepository: Send + Sync {
    async fn all_researchers(&self) -> RepositoryResult<Vec<Researcher>>;

    /// Manual per-week overrides for the given week, all researchers.
    async fn availability_weeks(&self, week: PlanWeek) -> RepositoryResult<Vec<AvailabilityWeek>>;

    /// Upsert one manual per-week override row.
    async fn upsert_availability_week(&self, entry: &AvailabilityWeek) -> RepositoryResult<()>;

    async fn patterns_for_researcher(
        &self,
        researcher_id: ResearcherId,
    ) -> RepositoryResult<Vec<AvailabilityPattern>>;

    /// All patterns, for building a full-week capacity ledger.
    async fn all_patterns(&self) -> RepositoryResult<Vec<AvailabilityPattern>>;

    /// Insert a pattern, assigning its id.
    async fn insert_pattern(&self, pattern: &AvailabilityPattern) -> RepositoryResult<i64>;

    /// Update an existing pattern in place.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no pattern has that id
    async fn update_pattern(&self, pattern: &AvailabilityPattern) -> RepositoryResult<()>;

    async fn unavailability_for_researcher(
        &self,
        researcher_id: ResearcherId,
    ) -> RepositoryResult<Vec<UnavailabilityPeriod>>;

    async fn all_unavailability(&self) -> RepositoryResult<Vec<UnavailabilityPeriod>>;

    /// Insert an unavailability period, assigning its id.
    async fn insert_unavailability(
        &self,
        period: &UnavailabilityPeriod,
    ) -> RepositoryResult<i64>;

    /// Update an existing unavailability period in place.
    async fn update_unavailability(&self, period: &UnavailabilityPeriod) -> RepositoryResult<()>;
}
