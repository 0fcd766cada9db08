//! Domain model types for survey planning.

pub mod activity;
pub mod calendar;
pub mod catalog;
pub mod ids;
pub mod researcher;
pub mod visit;

pub use activity::{ActivityEvent, LifecycleAction};
pub use calendar::{DayPart, PlanWeek, SpacingUnit};
pub use catalog::{
    Catalog, Cluster, FunctionCategory, LogisticsFlag, MinSpacing, Project, Protocol,
    ProtocolVisitWindow, Species, SpeciesFamily, SurveyFunction,
};
pub use ids::{
    ClusterId, EventId, FunctionId, ProjectId, ProtocolId, ResearcherId, SpeciesId, VisitId,
    WindowId,
};
pub use researcher::{
    AvailabilityPattern, AvailabilityWeek, Qualifications, Researcher, UnavailabilityPeriod,
    WeeklyCaps,
};
pub use visit::{Visit, VisitStatus};
