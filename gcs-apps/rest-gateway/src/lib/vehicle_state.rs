//! Vehicle telemetry state shared between the ingest task and the
//! snapshot sampler.

use std::collections::HashMap;
use std::sync::Mutex;

use telemetry_apps::rest::{TelemetryRecord, TelemetrySnapshot, TelemetrySource};

/// Latest known record per message name, replaced wholesale as
/// datagrams arrive.
#[derive(Debug, Default)]
pub struct VehicleState {
    records: Mutex<HashMap<String, TelemetryRecord>>,
}

impl VehicleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the newest record for its message, replacing any previous
    /// one.
    pub fn update(&self, record: TelemetryRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.insert(record.message.clone(), record);
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }
}

impl TelemetrySource for VehicleState {
    fn sample(&self) -> TelemetrySnapshot {
        // A poisoned lock degrades to an empty snapshot rather than
        // taking the sampler down with the writer.
        match self.records.lock() {
            Ok(records) => {
                let mut snapshot = TelemetrySnapshot::new();
                for record in records.values() {
                    snapshot.insert(record.clone());
                }
                snapshot
            }
            Err(_) => TelemetrySnapshot::new(),
        }
    }
}
