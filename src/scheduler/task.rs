//! The recurring planner trigger.
//!
//! [`PlannerTask`] is an explicit task object: it owns its cron
//! schedule, its single-flight lock, and the handle of its spawned loop.
//! The binary constructs one and injects the repository; nothing here is
//! process-global.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Local, Utc};
use cron::Schedule;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{PlannerConfig, TriggerConfig};
use crate::db::repository::FullRepository;
use crate::models::{ActivityEvent, EventId, PlanWeek};
use crate::services::planner;

/// Errors constructing or driving the trigger.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("invalid cron expression '{expression}': {source}")]
    InvalidCron {
        expression: String,
        #[source]
        source: cron::error::Error,
    },
}

struct TaskInner {
    repo: Arc<dyn FullRepository>,
    planner_config: PlannerConfig,
    week_offset: i64,
    /// Single-flight guard: a tick landing while a run is still going is
    /// skipped, never queued.
    run_lock: Mutex<()>,
}

impl TaskInner {
    /// Execute one planning round, unless one is already running.
    async fn tick(&self) {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("previous planning run still in progress, skipping this tick");
            return;
        };

        let today = Local::now().date_naive();
        let week = PlanWeek::from_date(today + Duration::days(7 * self.week_offset));
        match planner::run(self.repo.as_ref(), week, today, &self.planner_config).await {
            Ok(outcome) => {
                info!(
                    %week,
                    planned = outcome.planned.len(),
                    unplanned = outcome.unplanned.len(),
                    skipped = outcome.skipped.len(),
                    unstaffed = outcome.unstaffed.len(),
                    "scheduled planning run completed"
                );
                let event = ActivityEvent {
                    id: EventId::new(0),
                    actor_id: None,
                    action: "weekly_planner_run".to_string(),
                    target_type: "plan_week".to_string(),
                    target_id: week.week as i64,
                    details: serde_json::json!({
                        "week": week.to_string(),
                        "planned": outcome.planned.len(),
                        "unplanned": outcome.unplanned.len(),
                        "skipped": outcome.skipped.len(),
                        "unstaffed": outcome.unstaffed.len(),
                    }),
                    created_at: Utc::now(),
                };
                if let Err(err) = self.repo.append_event(event).await {
                    warn!(error = %err, "failed to record planning run in activity log");
                }
            }
            Err(err) => {
                // Nothing was committed; the next tick starts clean.
                warn!(error = %err, "scheduled planning run failed");
            }
        }
    }
}

/// Recurring weekly-planning task.
pub struct PlannerTask {
    inner: Arc<TaskInner>,
    schedule: Schedule,
    enabled: bool,
    handle: Option<JoinHandle<()>>,
}

impl PlannerTask {
    /// Build a task from configuration. Fails only on a bad cron
    /// expression.
    pub fn new(
        repo: Arc<dyn FullRepository>,
        planner_config: PlannerConfig,
        trigger: TriggerConfig,
    ) -> Result<Self, TriggerError> {
        let schedule =
            Schedule::from_str(&trigger.cron).map_err(|source| TriggerError::InvalidCron {
                expression: trigger.cron.clone(),
                source,
            })?;
        Ok(Self {
            inner: Arc::new(TaskInner {
                repo,
                planner_config,
                week_offset: trigger.week_offset,
                run_lock: Mutex::new(()),
            }),
            schedule,
            enabled: trigger.enabled,
            handle: None,
        })
    }

    /// Spawn the trigger loop. A disabled trigger spawns nothing.
    pub fn start(&mut self) {
        if !self.enabled {
            info!("planner trigger disabled, not starting");
            return;
        }
        if self.handle.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let schedule = self.schedule.clone();
        self.handle = Some(tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    warn!("cron schedule yields no further fire times, stopping trigger");
                    break;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                info!(next_fire = %next, "planner trigger sleeping until next tick");
                tokio::time::sleep(wait).await;
                inner.tick().await;
            }
        }));
    }

    /// Run one planning round immediately, outside the cron cadence.
    /// Shares the single-flight lock with scheduled ticks.
    pub async fn run_now(&self) {
        self.inner.tick().await;
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Stop the trigger loop. In-flight work is aborted.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("planner trigger stopped");
        }
    }
}

impl Drop for PlannerTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}
