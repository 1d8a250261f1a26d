//! Prometheus metrics exposed by the REST server.

use prometheus::{Gauge, IntCounter, IntGauge, Registry};

/// Registry plus the gateway's gauges and counters, populated by the
/// `/metrics` handler on each scrape.
#[derive(Clone)]
pub struct RestMetrics {
    pub registry: Registry,
    pub uptime_seconds: Gauge,
    pub rest_requests_total: IntCounter,
    pub snapshot_records: IntGauge,
    pub snapshot_available: IntGauge,
}

impl RestMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let uptime_seconds = Gauge::new(
            "mav_uptime_seconds",
            "Seconds since the REST server was created",
        )?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let rest_requests_total = IntCounter::new(
            "mav_rest_requests_total",
            "Total snapshot queries served by the REST interface",
        )?;
        registry.register(Box::new(rest_requests_total.clone()))?;

        let snapshot_records = IntGauge::new(
            "mav_snapshot_records",
            "Number of telemetry records in the current snapshot",
        )?;
        registry.register(Box::new(snapshot_records.clone()))?;

        let snapshot_available = IntGauge::new(
            "mav_snapshot_available",
            "Whether a telemetry snapshot has been installed (0/1)",
        )?;
        registry.register(Box::new(snapshot_available.clone()))?;

        Ok(Self {
            registry,
            uptime_seconds,
            rest_requests_total,
            snapshot_records,
            snapshot_available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    #[test]
    fn metrics_register_and_encode() {
        let metrics = RestMetrics::new().unwrap();
        metrics.rest_requests_total.inc();
        metrics.snapshot_available.set(1);

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metrics.registry.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("mav_rest_requests_total 1"));
        assert!(text.contains("mav_snapshot_available 1"));
    }
}
