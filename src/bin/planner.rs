//! Survey planner daemon binary.
//!
//! Wires a repository into the recurring planner trigger and runs until
//! interrupted.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --bin planner
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (default: info)
//! - `PLANNER_STRATEGY`: `greedy` or `backtracking` (default)
//! - `PLANNER_TIME_BUDGET_MS`: search budget per run (default: 500)
//! - `PLANNER_LOOKAHEAD_WEEKS`: lookahead horizon (default: 9)
//! - `PLANNER_TRIGGER_ENABLED`: `true`/`false` (default: true)
//! - `PLANNER_TRIGGER_CRON`: six-field cron expression
//! - `PLANNER_WEEK_OFFSET`: which week to plan, relative to today

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use survey_planner::config::{PlannerConfig, TriggerConfig};
use survey_planner::db::LocalRepository;
use survey_planner::scheduler::PlannerTask;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    info!("Starting survey planner");

    let planner_config = PlannerConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("invalid planner configuration")?;
    let trigger_config = TriggerConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("invalid trigger configuration")?;

    let repository = Arc::new(LocalRepository::new());
    let mut task = PlannerTask::new(repository, planner_config, trigger_config)
        .context("building planner trigger")?;
    task.start();

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutting down");
    task.shutdown();

    Ok(())
}
