//! Helpers shared by the REST gateway integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use telemetry_apps::rest::{
    FieldValue, RestServer, SnapshotStore, TelemetryRecord, TelemetrySnapshot, TelemetrySource,
};
use tracing_subscriber::EnvFilter;

pub fn start_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// Reserve an ephemeral TCP port on the loopback interface.
pub fn get_available_address() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind an ephemeral tcp port");
    listener.local_addr().expect("ephemeral tcp port address")
}

/// Reserve an ephemeral UDP port on the loopback interface.
pub fn get_available_udp_address() -> SocketAddr {
    let socket = std::net::UdpSocket::bind("127.0.0.1:0").expect("bind an ephemeral udp port");
    socket.local_addr().expect("ephemeral udp port address")
}

/// Fixed GPS + ATTITUDE sample, the smallest realistic vehicle
/// snapshot.
pub struct FixedTelemetrySource;

impl TelemetrySource for FixedTelemetrySource {
    fn sample(&self) -> TelemetrySnapshot {
        let mut snapshot = TelemetrySnapshot::new();
        snapshot.insert(
            TelemetryRecord::new("GPS")
                .with_field("lat", FieldValue::Float(1.0))
                .with_field("lon", FieldValue::Float(2.0)),
        );
        snapshot.insert(
            TelemetryRecord::new("ATTITUDE")
                .with_field("roll", FieldValue::Float(0.25))
                .with_field("pitch", FieldValue::Float(-0.5)),
        );
        snapshot
    }
}

/// Start a REST server over a pre-refreshed fixed snapshot.
pub async fn start_rest_server() -> (Arc<RestServer>, SocketAddr) {
    let store = Arc::new(SnapshotStore::new(
        Duration::from_secs(1),
        Some(Arc::new(FixedTelemetrySource) as Arc<dyn TelemetrySource>),
    ));
    store.refresh();

    let server =
        Arc::new(RestServer::new(get_available_address(), store).expect("REST server construction"));
    let bound = server.start().await.expect("REST server start");
    (server, bound)
}

/// Start a REST server with no snapshot ever installed.
pub async fn start_empty_rest_server() -> (Arc<RestServer>, SocketAddr) {
    let store = Arc::new(SnapshotStore::new(Duration::from_secs(1), None));
    let server =
        Arc::new(RestServer::new(get_available_address(), store).expect("REST server construction"));
    let bound = server.start().await.expect("REST server start");
    (server, bound)
}
