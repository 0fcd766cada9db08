//! Storage layer for the planner.
//!
//! Follows the repository pattern: `repository` holds the trait
//! definitions and error types, `repositories` the implementations.
//! Services receive a `&dyn FullRepository` (or a narrower trait) from
//! the caller; there is no global repository handle.

pub mod repositories;
pub mod repository;

pub use repositories::LocalRepository;
pub use repository::{
    ActivityLogRepository, CatalogRepository, ErrorContext, FullRepository, PlanMutation,
    RepositoryError, RepositoryResult, ResearcherRepository, StaffedVisit, VisitRepository,
};
