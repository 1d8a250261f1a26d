//! REST snapshot service for vehicle telemetry.
//!
//! Serves the latest known telemetry records over a read-only HTTP JSON
//! API. Read-only - does not modify any vehicle state.
//!
//! ## Architecture
//!
//! - **Telemetry source**: the host process owns the live telemetry and
//!   implements [`TelemetrySource`]
//! - **Snapshot store**: periodically samples the source and swaps the
//!   shared snapshot reference
//! - **REST server**: projects the current snapshot to JSON per request
//!   and resolves slash-delimited path queries into the projected tree

pub mod http_server;
pub mod path;
pub mod projection;
pub mod prometheus_metrics;
pub mod record;
pub mod snapshot_store;

pub use http_server::{RestServer, RestServerError};
pub use path::{resolve_path, PathResolution};
pub use projection::{project_record, project_snapshot, ProjectionError};
pub use prometheus_metrics::RestMetrics;
pub use record::{FieldValue, TelemetryRecord, TelemetrySnapshot, TelemetrySource};
pub use snapshot_store::SnapshotStore;
