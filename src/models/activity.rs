//! Append-only activity log entries and the lifecycle actions that bear
//! on visit status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EventId, ResearcherId};
use super::visit::VisitStatus;

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: EventId,
    pub actor_id: Option<ResearcherId>,
    pub action: String,
    pub target_type: String,
    pub target_id: i64,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Closed set of actions that drive a visit's derived status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Executed,
    ExecutedWithDeviation,
    NotExecuted,
    Approved,
    Rejected,
    Cancelled,
    /// Prior explicit status withdrawn; status falls back to field
    /// inference.
    StatusCleared,
}

impl LifecycleAction {
    /// Parse a raw log action string. Both spellings of the deviation
    /// action occur in historical data.
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "visit_executed" => Some(LifecycleAction::Executed),
            "visit_executed_with_deviation" | "visit_executed_deviation" => {
                Some(LifecycleAction::ExecutedWithDeviation)
            }
            "visit_not_executed" => Some(LifecycleAction::NotExecuted),
            "visit_approved" => Some(LifecycleAction::Approved),
            "visit_rejected" => Some(LifecycleAction::Rejected),
            "visit_cancelled" => Some(LifecycleAction::Cancelled),
            "visit_status_cleared" => Some(LifecycleAction::StatusCleared),
            _ => None,
        }
    }

    /// All action strings that carry status weight, for log queries.
    pub const STATUS_ACTIONS: [&'static str; 8] = [
        "visit_executed",
        "visit_executed_with_deviation",
        "visit_executed_deviation",
        "visit_not_executed",
        "visit_approved",
        "visit_rejected",
        "visit_cancelled",
        "visit_status_cleared",
    ];

    /// The status an explicit action pins, if it pins one.
    pub fn pinned_status(&self) -> Option<VisitStatus> {
        match self {
            LifecycleAction::Cancelled => Some(VisitStatus::Cancelled),
            LifecycleAction::Rejected => Some(VisitStatus::Rejected),
            LifecycleAction::Approved => Some(VisitStatus::Approved),
            LifecycleAction::ExecutedWithDeviation => Some(VisitStatus::ExecutedWithDeviation),
            LifecycleAction::Executed => Some(VisitStatus::Executed),
            LifecycleAction::NotExecuted => Some(VisitStatus::NotExecuted),
            LifecycleAction::StatusCleared => None,
        }
    }
}
