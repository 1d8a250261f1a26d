//! Snapshot store shared between the refresh tick and the REST server.
//!
//! The store holds the current snapshot behind a single `Arc` that is
//! swapped wholesale on every refresh. Request handlers clone the `Arc`
//! and never the data, so they always observe either the previous or
//! the latest complete snapshot - never a partially-written one. A
//! request racing a refresh may see either side of the swap; that is
//! eventual consistency by contract.
//!
//! ```text
//! Telemetry source                 REST server
//! ────────────────                 ───────────
//!       │                               │
//!       │ sample() on the               │ latest() per request,
//!       │ refresh tick only             │ Arc clone, no source locks
//!       │                               │
//!       └──────────┐       ┌────────────┘
//!            ┌─────▼───────▼─────┐
//!            │   SnapshotStore   │
//!            │ (Arc swap, fast)  │
//!            └───────────────────┘
//! ```

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::debug;

use super::record::{TelemetrySnapshot, TelemetrySource};

/// Holds the current telemetry snapshot and refreshes it periodically
/// from an optional source.
pub struct SnapshotStore {
    snapshot: RwLock<Option<Arc<TelemetrySnapshot>>>,
    refresh_interval: Duration,
    source: Option<Arc<dyn TelemetrySource>>,
}

impl SnapshotStore {
    /// Create a store with no snapshot installed yet.
    ///
    /// A store without a source never installs a snapshot on its own;
    /// the REST server then answers every query with the no-data body.
    pub fn new(refresh_interval: Duration, source: Option<Arc<dyn TelemetrySource>>) -> Self {
        Self {
            snapshot: RwLock::new(None),
            refresh_interval,
            source,
        }
    }

    /// Get the current snapshot reference, if one has been installed.
    ///
    /// This is a fast read that does NOT touch the telemetry source.
    /// The returned snapshot may be up to `refresh_interval` old.
    pub fn latest(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.snapshot.read().unwrap().clone()
    }

    /// Sample the source and swap the shared reference.
    ///
    /// This is the only place the source's own locks are taken, and it
    /// runs on the refresh cadence, not per request.
    pub fn refresh(&self) {
        if let Some(source) = &self.source {
            let snapshot = Arc::new(source.sample());
            *self.snapshot.write().unwrap() = Some(snapshot);
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Run the periodic refresh until `shutdown_signal` completes.
    ///
    /// The tick is independent of the REST listener lifecycle: stopping
    /// or rebinding the HTTP server does not disturb the cadence.
    pub async fn run_refresh(self: Arc<Self>, shutdown_signal: impl Future<Output = ()> + Send) {
        let mut interval = tokio::time::interval(self.refresh_interval);
        tokio::pin!(shutdown_signal);
        loop {
            tokio::select! {
                _ = interval.tick() => self.refresh(),
                _ = &mut shutdown_signal => break,
            }
        }
        debug!("Snapshot refresh task stopped");
    }
}
