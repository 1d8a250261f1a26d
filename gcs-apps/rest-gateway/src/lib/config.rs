//! ## REST Gateway Configuration Module
//!
//! Defines [`RestGatewayConfig`], the primary configuration structure
//! for the gateway: where the REST snapshot server binds, where the
//! telemetry ingest listens, and how often the snapshot is refreshed.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration for the REST telemetry gateway.
#[derive(Debug, Deserialize, Clone)]
pub struct RestGatewayConfig {
    /// The address the REST snapshot server binds to.
    rest_address: SocketAddr,
    /// The UDP address the telemetry ingest listens on.
    telemetry_listen_address: SocketAddr,
    /// How often the snapshot store samples the vehicle state, in
    /// seconds.
    #[serde(default = "default_snapshot_refresh_secs")]
    snapshot_refresh_secs: u64,
    /// The path to the log file where the gateway will write logs.
    #[serde(default)]
    log_file: Option<PathBuf>,
}

fn default_snapshot_refresh_secs() -> u64 {
    1
}

impl RestGatewayConfig {
    /// Creates a new [`RestGatewayConfig`] instance.
    pub fn new(
        rest_address: SocketAddr,
        telemetry_listen_address: SocketAddr,
        snapshot_refresh_secs: u64,
    ) -> Self {
        Self {
            rest_address,
            telemetry_listen_address,
            snapshot_refresh_secs,
            log_file: None,
        }
    }

    /// Returns the REST server bind address.
    pub fn rest_address(&self) -> SocketAddr {
        self.rest_address
    }

    /// Returns the telemetry ingest listen address.
    pub fn telemetry_listen_address(&self) -> SocketAddr {
        self.telemetry_listen_address
    }

    /// Returns the snapshot refresh cadence in seconds.
    pub fn snapshot_refresh_secs(&self) -> u64 {
        self.snapshot_refresh_secs
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn set_log_file(&mut self, log_file: Option<PathBuf>) {
        if let Some(log_file) = log_file {
            self.log_file = Some(log_file);
        }
    }
}
