//! Repository trait definitions for planner storage.
//!
//! Storage is split across focused traits so implementations stay
//! testable and services can name only the capabilities they need:
//!
//! - [`error`]: Error types for repository operations
//! - [`visits`]: Visit reads and the atomic plan mutation
//! - [`catalog`]: Read-only reference data
//! - [`researchers`]: People, qualifications, availability
//! - [`activity`]: Append-only audit log
//!
//! Functions needing everything take the [`FullRepository`] bound.

pub mod activity;
pub mod catalog;
pub mod error;
pub mod researchers;
pub mod visits;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use activity::ActivityLogRepository;
pub use catalog::CatalogRepository;
pub use researchers::ResearcherRepository;
pub use visits::{PlanMutation, StaffedVisit, VisitRepository};

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type implementing all four
/// repository traits.
pub trait FullRepository:
    VisitRepository + CatalogRepository + ResearcherRepository + ActivityLogRepository
{
}

impl<T> FullRepository for T where
    T: VisitRepository + CatalogRepository + ResearcherRepository + ActivityLogRepository
{
}
