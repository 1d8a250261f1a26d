//! HTTP server for exposing the telemetry snapshot using Axum.
//!
//! Owns the listener lifecycle: at most one listener and one serve task
//! exist at a time, `stop()` joins the serve task so the socket is
//! released before it returns, and a bind failure leaves the server
//! stopped. Data-path failures never surface as HTTP error statuses -
//! every query outcome is a well-formed JSON body with status 200.

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use super::{
    path::resolve_path,
    projection::{project_snapshot, ProjectionError},
    prometheus_metrics::RestMetrics,
    snapshot_store::SnapshotStore,
};

#[derive(Debug, Error)]
pub enum RestServerError {
    #[error("REST server already running")]
    AlreadyRunning,
    #[error("REST server is not running")]
    NotRunning,
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Shared state for all HTTP handlers
#[derive(Clone)]
struct ServerState {
    store: Arc<SnapshotStore>,
    start_time: u64,
    metrics: RestMetrics,
}

/// The bound listener's serve task plus its shutdown trigger.
struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<(), std::io::Error>>,
}

/// HTTP server that exposes the current telemetry snapshot as JSON.
///
/// Lifecycle: Stopped (initial) -> Running -> Stopped, restartable.
/// The listener socket and serve task are owned exclusively by this
/// struct; the snapshot store is the only state shared with the rest
/// of the application.
pub struct RestServer {
    state: ServerState,
    bind_address: Mutex<SocketAddr>,
    listener: tokio::sync::Mutex<Option<ListenerHandle>>,
    running: AtomicBool,
}

impl RestServer {
    pub fn new(bind_address: SocketAddr, store: Arc<SnapshotStore>) -> Result<Self, RestServerError> {
        let start_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let metrics = RestMetrics::new()?;

        Ok(Self {
            state: ServerState {
                store,
                start_time,
                metrics,
            },
            bind_address: Mutex::new(bind_address),
            listener: tokio::sync::Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    /// The address the next `start()` will bind.
    pub fn bind_address(&self) -> SocketAddr {
        *self.bind_address.lock().unwrap()
    }

    /// Whether a listener is currently bound. Never blocks on the
    /// listener's own execution.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Bind the configured address and start serving on a background
    /// task. Returns the bound address (useful when binding port 0).
    ///
    /// Rejected with `AlreadyRunning` if a listener is already bound; a
    /// bind failure leaves the server stopped with nothing spawned.
    pub async fn start(&self) -> Result<SocketAddr, RestServerError> {
        let mut listener_slot = self.listener.lock().await;
        if listener_slot.is_some() {
            return Err(RestServerError::AlreadyRunning);
        }

        let address = self.bind_address();
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| RestServerError::Bind { address, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| RestServerError::Bind { address, source })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let app = self.router();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        *listener_slot = Some(ListenerHandle {
            local_addr,
            shutdown: shutdown_tx,
            task,
        });
        self.running.store(true, Ordering::SeqCst);

        info!("REST server running on http://{}", local_addr);
        Ok(local_addr)
    }

    /// Signal the listener to shut down and wait for the serve task to
    /// finish. The socket is fully released when this returns, so the
    /// same address can be rebound immediately.
    pub async fn stop(&self) -> Result<(), RestServerError> {
        let mut listener_slot = self.listener.lock().await;
        let handle = listener_slot.take().ok_or(RestServerError::NotRunning)?;
        self.running.store(false, Ordering::SeqCst);

        let _ = handle.shutdown.send(());
        match handle.task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("REST listener on {} exited with error: {e}", handle.local_addr),
            Err(e) => warn!("REST listener task on {} failed to join: {e}", handle.local_addr),
        }

        info!("REST server on {} stopped", handle.local_addr);
        Ok(())
    }

    /// Stop any running listener, swap the bind address and start.
    /// Stopping first guarantees no two listeners are ever bound, even
    /// transiently.
    pub async fn reconfigure(&self, address: SocketAddr) -> Result<SocketAddr, RestServerError> {
        match self.stop().await {
            Ok(()) | Err(RestServerError::NotRunning) => {}
            Err(e) => return Err(e),
        }
        *self.bind_address.lock().unwrap() = address;
        self.start().await
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/", get(handle_root))
            .route("/health", get(handle_health))
            .route("/rest/mavlink", get(handle_full_snapshot))
            .route("/rest/mavlink/", get(handle_full_snapshot))
            .route("/rest/mavlink/{*path}", get(handle_path_query))
            .route("/metrics", get(handle_prometheus_metrics))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }
}

// Response types for the ancillary endpoints
#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    timestamp: u64,
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
}

/// Build the JSON body for one snapshot query.
///
/// No snapshot (or an empty one) answers with the no-data body, a
/// projection failure degrades to an empty object with the cause
/// logged, and a path miss renders as the structured diagnostic. All
/// of these are status 200 for compatibility with existing clients.
fn query_snapshot(store: &SnapshotStore, path: &str) -> Value {
    let Some(snapshot) = store.latest() else {
        return json!({ "result": "No message" });
    };

    let projected = match project_snapshot(&snapshot) {
        Ok(projected) => projected,
        Err(ProjectionError::NoData) => return json!({ "result": "No message" }),
        Err(e) => {
            error!("Snapshot projection failed: {e}");
            return json!({});
        }
    };

    resolve_path(&projected, path).into_json()
}

/// Root endpoint - lists all available APIs
async fn handle_root() -> Json<Value> {
    Json(json!({
        "service": "MAV REST telemetry gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/": "This endpoint - API listing",
            "/health": "Health check",
            "/rest/mavlink/": "Full projected telemetry snapshot",
            "/rest/mavlink/{path}": "Snapshot sub-tree at a slash-delimited key path",
            "/metrics": "Prometheus metrics"
        }
    }))
}

/// Health check endpoint
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
    })
}

/// Full snapshot query (empty path)
async fn handle_full_snapshot(State(state): State<ServerState>) -> Json<Value> {
    state.metrics.rest_requests_total.inc();
    Json(query_snapshot(&state.store, ""))
}

/// Path query into the projected snapshot
async fn handle_path_query(
    Path(path): Path<String>,
    State(state): State<ServerState>,
) -> Json<Value> {
    state.metrics.rest_requests_total.inc();
    Json(query_snapshot(&state.store, &path))
}

/// Handler for Prometheus metrics endpoint
async fn handle_prometheus_metrics(State(state): State<ServerState>) -> Response {
    let uptime_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .saturating_sub(state.start_time);
    state.metrics.uptime_seconds.set(uptime_secs as f64);

    let snapshot = state.store.latest();
    state.metrics.snapshot_available.set(snapshot.is_some() as i64);
    state
        .metrics
        .snapshot_records
        .set(snapshot.map(|snapshot| snapshot.len()).unwrap_or(0) as i64);

    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry.gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => match String::from_utf8(buffer) {
            Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("UTF-8 error: {}", e),
                }),
            )
                .into_response(),
        },
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Encoding error: {}", e),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::record::{FieldValue, TelemetryRecord, TelemetrySnapshot, TelemetrySource};
    use std::time::Duration;

    struct MockVehicleSource;
    impl TelemetrySource for MockVehicleSource {
        fn sample(&self) -> TelemetrySnapshot {
            let mut snapshot = TelemetrySnapshot::new();
            snapshot.insert(
                TelemetryRecord::new("GPS")
                    .with_field("lat", FieldValue::Float(1.0))
                    .with_field("lon", FieldValue::Float(2.0)),
            );
            snapshot
        }
    }

    struct BrokenSource;
    impl TelemetrySource for BrokenSource {
        fn sample(&self) -> TelemetrySnapshot {
            let mut snapshot = TelemetrySnapshot::new();
            snapshot.insert(
                TelemetryRecord::new("STATUSTEXT")
                    .with_field("text", FieldValue::Bytes(vec![0xff, 0xfe])),
            );
            snapshot
        }
    }

    fn populated_store() -> Arc<SnapshotStore> {
        let store = Arc::new(SnapshotStore::new(
            Duration::from_secs(1),
            Some(Arc::new(MockVehicleSource)),
        ));
        store.refresh();
        store
    }

    fn empty_store() -> Arc<SnapshotStore> {
        Arc::new(SnapshotStore::new(Duration::from_secs(1), None))
    }

    fn local_server(store: Arc<SnapshotStore>) -> RestServer {
        RestServer::new("127.0.0.1:0".parse().unwrap(), store).unwrap()
    }

    #[test]
    fn query_without_snapshot_reports_no_message() {
        assert_eq!(
            query_snapshot(&empty_store(), ""),
            json!({ "result": "No message" })
        );
    }

    #[test]
    fn empty_path_returns_full_projection() {
        assert_eq!(
            query_snapshot(&populated_store(), ""),
            json!({ "GPS": { "lat": "1.0", "lon": "2.0" } })
        );
    }

    #[test]
    fn query_resolves_nested_value() {
        assert_eq!(query_snapshot(&populated_store(), "GPS/lat"), json!("1.0"));
    }

    #[test]
    fn query_miss_returns_diagnostic() {
        let body = query_snapshot(&populated_store(), "ATTITUDE/roll");
        assert_eq!(body["key"], json!("ATTITUDE"));
        assert_eq!(body["last_dict"]["GPS"]["lat"], json!("1.0"));
    }

    #[test]
    fn projection_failure_degrades_to_empty_object() {
        let store = Arc::new(SnapshotStore::new(
            Duration::from_secs(1),
            Some(Arc::new(BrokenSource)),
        ));
        store.refresh();
        assert_eq!(query_snapshot(&store, ""), json!({}));
    }

    #[tokio::test]
    async fn start_stop_cycle() {
        let server = local_server(populated_store());
        assert!(!server.running());

        let bound = server.start().await.unwrap();
        assert!(server.running());
        assert_ne!(bound.port(), 0);

        server.stop().await.unwrap();
        assert!(!server.running());
    }

    #[tokio::test]
    async fn second_start_reports_already_running() {
        let server = local_server(populated_store());
        server.start().await.unwrap();

        assert!(matches!(
            server.start().await,
            Err(RestServerError::AlreadyRunning)
        ));
        // the first listener is untouched
        assert!(server.running());
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_when_stopped_reports_not_running() {
        let server = local_server(empty_store());
        assert!(matches!(
            server.stop().await,
            Err(RestServerError::NotRunning)
        ));
        assert!(!server.running());
    }

    #[tokio::test]
    async fn bind_failure_leaves_server_stopped() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = occupied.local_addr().unwrap();

        let server = RestServer::new(address, empty_store()).unwrap();
        assert!(matches!(
            server.start().await,
            Err(RestServerError::Bind { .. })
        ));
        assert!(!server.running());

        // a later start on a free port still works
        let recovered = server
            .reconfigure("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert!(server.running());
        assert_ne!(recovered.port(), 0);
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn reconfigure_releases_the_previous_listener() {
        let server = local_server(populated_store());
        let first = server.start().await.unwrap();

        // Rebinding the very same port proves the old socket was fully
        // released before the new bind attempt began.
        let second = server.reconfigure(first).await.unwrap();
        assert_eq!(first, second);
        assert!(server.running());
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn reconfigure_while_stopped_starts_the_listener() {
        let server = local_server(populated_store());
        let bound = server
            .reconfigure("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert!(server.running());
        assert_eq!(server.bind_address(), "127.0.0.1:0".parse().unwrap());
        assert_ne!(bound.port(), 0);
        server.stop().await.unwrap();
    }
}
