//! ## REST Telemetry Gateway
//!
//! Provides the core logic and main struct ([`RestTelemetryGateway`])
//! for running a vehicle telemetry REST gateway: a UDP ingest task
//! keeps the vehicle state current, a snapshot store samples that
//! state on a fixed cadence, and the REST server answers read-only
//! JSON queries against the latest snapshot.
//!
//! The `start` method is the main entry point; it wires the subsystems
//! together and then supervises them until ctrl-c or a fatal subsystem
//! status arrives.

use std::{sync::Arc, time::Duration};

use async_channel::unbounded;
use telemetry_apps::{
    rest::{RestServer, RestServerError, SnapshotStore, TelemetrySource},
    task_manager::TaskManager,
    SHUTDOWN_BROADCAST_CAPACITY,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    config::RestGatewayConfig,
    error::GatewayErrorKind,
    status::{State, Status},
    utils::ShutdownMessage,
    vehicle_state::VehicleState,
};

pub mod config;
pub mod error;
mod io_task;
pub mod status;
pub mod utils;
pub mod vehicle_state;

/// The main struct that manages the REST telemetry gateway.
#[derive(Debug, Clone)]
pub struct RestTelemetryGateway {
    config: RestGatewayConfig,
    notify_shutdown: broadcast::Sender<ShutdownMessage>,
}

impl RestTelemetryGateway {
    /// Creates a new [`RestTelemetryGateway`] instance.
    pub fn new(config: RestGatewayConfig) -> Self {
        let (notify_shutdown, _) =
            broadcast::channel::<ShutdownMessage>(SHUTDOWN_BROADCAST_CAPACITY);
        Self {
            config,
            notify_shutdown,
        }
    }

    /// Starts the gateway main loop.
    pub async fn start(&self) -> Result<(), GatewayErrorKind> {
        if self.config.snapshot_refresh_secs() == 0 {
            return Err(GatewayErrorKind::Configuration(
                "snapshot_refresh_secs must be at least 1".to_string(),
            ));
        }

        let notify_shutdown = self.notify_shutdown.clone();
        let task_manager = Arc::new(TaskManager::new());
        let (status_sender, status_receiver) = unbounded::<Status>();

        let vehicle_state = Arc::new(VehicleState::new());
        let store = Arc::new(SnapshotStore::new(
            Duration::from_secs(self.config.snapshot_refresh_secs()),
            Some(vehicle_state.clone() as Arc<dyn TelemetrySource>),
        ));
        debug!("Vehicle state and snapshot store initialized.");

        // The refresh tick keeps its own cadence; REST listener restarts
        // never disturb it.
        let mut notify_shutdown_refresh = notify_shutdown.subscribe();
        let refresh_shutdown_signal = async move {
            loop {
                match notify_shutdown_refresh.recv().await {
                    Ok(ShutdownMessage::ShutdownAll) | Err(_) => break,
                }
            }
        };
        let store_for_refresh = store.clone();
        task_manager.spawn(store_for_refresh.run_refresh(refresh_shutdown_signal));

        task_manager.spawn(io_task::start_ingest(
            self.config.telemetry_listen_address(),
            vehicle_state.clone(),
            notify_shutdown.subscribe(),
            status_sender.clone(),
        ));

        info!(
            "Initializing REST snapshot server on http://{}",
            self.config.rest_address()
        );
        let rest_server = Arc::new(RestServer::new(self.config.rest_address(), store.clone())?);
        rest_server.start().await?;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received — initiating graceful shutdown...");
                    let _ = notify_shutdown.send(ShutdownMessage::ShutdownAll);
                    break;
                }
                message = status_receiver.recv() => {
                    if let Ok(status) = message {
                        match status.state {
                            State::IngestShutdown(reason) => {
                                warn!("Telemetry ingest stopped ({reason}) — initiating full shutdown.");
                                let _ = notify_shutdown.send(ShutdownMessage::ShutdownAll);
                                break;
                            }
                        }
                    }
                }
            }
        }

        match rest_server.stop().await {
            Ok(()) | Err(RestServerError::NotRunning) => {}
            Err(e) => error!("REST server shutdown error: {e}"),
        }

        warn!("Graceful shutdown");
        task_manager.abort_all().await;
        info!("Joining remaining tasks...");
        task_manager.join_all().await;
        info!("REST gateway shutdown complete.");
        Ok(())
    }
}

impl Drop for RestTelemetryGateway {
    fn drop(&mut self) {
        info!("RestTelemetryGateway dropped");
        let _ = self.notify_shutdown.send(ShutdownMessage::ShutdownAll);
    }
}
