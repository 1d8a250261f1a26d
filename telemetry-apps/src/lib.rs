//! Shared infrastructure for the MAV REST gateway applications.
//!
//! Hosts the REST telemetry snapshot service (`rest`) and the task
//! supervision helper (`task_manager`) used by the app crates.

pub mod rest;
pub mod task_manager;

/// Capacity of the shutdown broadcast channel used by the apps.
pub const SHUTDOWN_BROADCAST_CAPACITY: usize = 32;
