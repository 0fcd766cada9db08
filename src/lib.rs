//! # Survey Planner
//!
//! Weekly assignment engine for ecological field surveys.
//!
//! Clusters of survey locations carry visits prescribed by species
//! protocols: how many visits, in which calendar windows, and how far
//! apart. Each week the planner staffs the open visits with qualified
//! researchers within their availability, respects minimum spacing in
//! both directions, and commits the whole round atomically.
//!
//! ## Architecture
//!
//! - [`models`]: domain entities, typed ids, calendar helpers
//! - [`db`]: repository traits and the in-memory implementation
//! - [`services`]: status derivation, qualification, capacity,
//!   frequency guard, window backfill, availability administration,
//!   and the weekly assignment engine
//! - [`scheduler`]: the recurring cron-driven trigger
//! - [`config`]: environment-driven configuration

pub mod config;
pub mod db;
pub mod models;
pub mod scheduler;
pub mod services;
