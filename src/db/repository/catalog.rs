//! Catalog repository trait: read-only reference data.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    Catalog, Cluster, Project, Protocol, ProtocolVisitWindow, Species, SurveyFunction,
};

/// Repository trait for reference-data reads.
///
/// Reference data changes rarely; the planner loads it once per run into
/// a [`Catalog`] and works from that.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn all_species(&self) -> RepositoryResult<Vec<Species>>;

    async fn all_functions(&self) -> RepositoryResult<Vec<SurveyFunction>>;

    async fn all_protocols(&self) -> RepositoryResult<Vec<Protocol>>;

    async fn all_windows(&self) -> RepositoryResult<Vec<ProtocolVisitWindow>>;

    async fn all_clusters(&self) -> RepositoryResult<Vec<Cluster>>;

    async fn all_projects(&self) -> RepositoryResult<Vec<Project>>;

    /// Load the full catalog in one shot.
    async fn load_catalog(&self) -> RepositoryResult<Catalog> {
        Ok(Catalog::new(
            self.all_species().await?,
            self.all_functions().await?,
            self.all_protocols().await?,
            self.all_windows().await?,
            self.all_clusters().await?,
            self.all_projects().await?,
        ))
    }
}
