//! Recurring execution of the weekly planner.

pub mod task;

pub use task::{PlannerTask, TriggerError};
