//! Environment-driven configuration.
//!
//! Every knob has a default so a bare environment runs; malformed values
//! are reported rather than silently replaced.

use std::time::Duration;

/// How the engine resolves staffing contention.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssignmentStrategy {
    /// Single deterministic pass; first fit wins.
    Greedy,
    /// Greedy pass plus bounded swap search that frees capacity for
    /// priority visits.
    Backtracking,
}

/// Configuration for one planning run.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub strategy: AssignmentStrategy,
    /// Wall-clock budget for the backtracking search. On expiry the best
    /// assignment set found so far is kept.
    pub time_budget: Duration,
    /// How many weeks past the run week the lookahead scan covers.
    pub lookahead_weeks: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            strategy: AssignmentStrategy::Backtracking,
            time_budget: Duration::from_millis(500),
            lookahead_weeks: 9,
        }
    }
}

impl PlannerConfig {
    /// Read configuration from the environment.
    ///
    /// Recognized variables:
    /// - `PLANNER_STRATEGY`: `greedy` or `backtracking`
    /// - `PLANNER_TIME_BUDGET_MS`: milliseconds, integer
    /// - `PLANNER_LOOKAHEAD_WEEKS`: integer
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("PLANNER_STRATEGY") {
            config.strategy = match value.to_ascii_lowercase().as_str() {
                "greedy" => AssignmentStrategy::Greedy,
                "backtracking" => AssignmentStrategy::Backtracking,
                other => return Err(format!("unknown PLANNER_STRATEGY '{other}'")),
            };
        }
        if let Ok(value) = std::env::var("PLANNER_TIME_BUDGET_MS") {
            let millis: u64 = value
                .parse()
                .map_err(|_| format!("invalid PLANNER_TIME_BUDGET_MS '{value}'"))?;
            config.time_budget = Duration::from_millis(millis);
        }
        if let Ok(value) = std::env::var("PLANNER_LOOKAHEAD_WEEKS") {
            config.lookahead_weeks = value
                .parse()
                .map_err(|_| format!("invalid PLANNER_LOOKAHEAD_WEEKS '{value}'"))?;
        }
        Ok(config)
    }
}

/// Configuration for the recurring trigger.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub enabled: bool,
    /// Six-field cron expression (seconds first).
    pub cron: String,
    /// Which week to plan, as an offset in weeks from the current one.
    pub week_offset: i64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // Mondays at 05:00 UTC.
            cron: "0 0 5 * * Mon".to_string(),
            week_offset: 1,
        }
    }
}

impl TriggerConfig {
    /// Read configuration from the environment.
    ///
    /// Recognized variables:
    /// - `PLANNER_TRIGGER_ENABLED`: `true`/`false`
    /// - `PLANNER_TRIGGER_CRON`: six-field cron expression
    /// - `PLANNER_WEEK_OFFSET`: integer weeks relative to today
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("PLANNER_TRIGGER_ENABLED") {
            config.enabled = match value.to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                other => return Err(format!("invalid PLANNER_TRIGGER_ENABLED '{other}'")),
            };
        }
        if let Ok(value) = std::env::var("PLANNER_TRIGGER_CRON") {
            config.cron = value;
        }
        if let Ok(value) = std::env::var("PLANNER_WEEK_OFFSET") {
            config.week_offset = value
                .parse()
                .map_err(|_| format!("invalid PLANNER_WEEK_OFFSET '{value}'"))?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.strategy, AssignmentStrategy::Backtracking);
        assert_eq!(config.time_budget, Duration::from_millis(500));
        assert_eq!(config.lookahead_weeks, 9);

        let trigger = TriggerConfig::default();
        assert!(trigger.enabled);
        assert_eq!(trigger.week_offset, 1);
    }
}
