//! Service layer: the planning business logic.
//!
//! Services are free functions (plus a few ledger/value types) that
//! work against the repository traits, so every piece runs unchanged on
//! any backend.

pub mod availability;
pub mod capacity;
pub mod frequency;
pub mod planner;
pub mod qualification;
pub mod status;
pub mod window_index;

#[cfg(test)]
#[path = "planner_tests.rs"]
mod planner_tests;

pub use availability::{
    create_pattern, create_unavailability, set_week_slots, update_pattern, update_unavailability,
    AvailabilityError,
};
pub use capacity::{CapacityLedger, LedgerSnapshot};
pub use frequency::{blocked_pairs, lookahead_violations, spacing_violated};
pub use planner::{run, PlanOutcome, PlannerError};
pub use qualification::qualifies;
pub use status::{derive_visit_status, resolve_statuses};
pub use window_index::{backfill_window_links, BackfillSummary};
