//! UDP telemetry ingest task.
//!
//! Receives JSON-encoded telemetry datagrams and folds them into the
//! shared [`VehicleState`]. Malformed datagrams are logged and dropped;
//! only socket-level failures take the task down, reported on the
//! status channel so the main loop can react.

use std::net::SocketAddr;
use std::sync::Arc;

use async_channel::Sender;
use serde_json::Value;
use telemetry_apps::rest::{FieldValue, TelemetryRecord};
use tokio::{net::UdpSocket, sync::broadcast};
use tracing::{debug, error, info, warn};

use crate::{
    status::{State, Status},
    utils::ShutdownMessage,
    vehicle_state::VehicleState,
};

const MAX_DATAGRAM_SIZE: usize = 64 * 1024;

pub async fn start_ingest(
    listen_address: SocketAddr,
    vehicle_state: Arc<VehicleState>,
    mut notify_shutdown: broadcast::Receiver<ShutdownMessage>,
    status_sender: Sender<Status>,
) {
    let socket = match UdpSocket::bind(listen_address).await {
        Ok(socket) => socket,
        Err(e) => {
            error!("Failed to bind telemetry ingest socket on {listen_address}: {e}");
            let _ = status_sender
                .send(Status {
                    state: State::IngestShutdown(e.to_string()),
                })
                .await;
            return;
        }
    };
    info!("Telemetry ingest listening on udp://{}", listen_address);

    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        tokio::select! {
            message = notify_shutdown.recv() => {
                match message {
                    Ok(ShutdownMessage::ShutdownAll) | Err(_) => {
                        info!("Telemetry ingest shutting down");
                        break;
                    }
                }
            }
            received = socket.recv_from(&mut buf) => {
                match received {
                    Ok((len, peer)) => match parse_record(&buf[..len]) {
                        Some(record) => {
                            debug!("Ingested {} from {peer}", record.message);
                            vehicle_state.update(record);
                        }
                        None => warn!("Dropping malformed telemetry datagram from {peer}"),
                    },
                    Err(e) => {
                        error!("Telemetry ingest socket error: {e}");
                        let _ = status_sender
                            .send(Status {
                                state: State::IngestShutdown(e.to_string()),
                            })
                            .await;
                        break;
                    }
                }
            }
        }
    }
}

/// Parse one datagram: a JSON object with a `"type"` tag whose other
/// scalar members become the record's fields. Nested values are not
/// telemetry scalars and are skipped.
pub(crate) fn parse_record(payload: &[u8]) -> Option<TelemetryRecord> {
    let value: Value = serde_json::from_slice(payload).ok()?;
    let object = value.as_object()?;
    let message = object.get("type")?.as_str()?;

    let mut record = TelemetryRecord::new(message);
    for (name, member) in object {
        if name == "type" {
            continue;
        }
        let field = match member {
            Value::Number(number) => {
                if let Some(v) = number.as_i64() {
                    FieldValue::Int(v)
                } else if let Some(v) = number.as_u64() {
                    FieldValue::UInt(v)
                } else {
                    FieldValue::Float(number.as_f64().unwrap_or_default())
                }
            }
            Value::String(text) => FieldValue::Text(text.clone()),
            Value::Bool(flag) => FieldValue::Bool(*flag),
            _ => {
                debug!("Skipping non-scalar field {message}.{name}");
                continue;
            }
        };
        record = record.with_field(name.clone(), field);
    }
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_heartbeat_datagram() {
        let payload = br#"{"type": "HEARTBEAT", "autopilot": 3, "base_mode": 81, "armed": false, "system_status": "STANDBY"}"#;
        let record = parse_record(payload).unwrap();

        assert_eq!(record.message, "HEARTBEAT");
        assert_eq!(record.field("autopilot"), Some(&FieldValue::Int(3)));
        assert_eq!(record.field("armed"), Some(&FieldValue::Bool(false)));
        assert_eq!(
            record.field("system_status"),
            Some(&FieldValue::Text("STANDBY".to_string()))
        );
    }

    #[test]
    fn float_fields_keep_their_fraction() {
        let payload = br#"{"type": "ATTITUDE", "roll": 0.25, "pitch": -1.5}"#;
        let record = parse_record(payload).unwrap();
        assert_eq!(record.field("roll"), Some(&FieldValue::Float(0.25)));
        assert_eq!(record.field("pitch"), Some(&FieldValue::Float(-1.5)));
    }

    #[test]
    fn rejects_datagrams_without_a_type_tag() {
        assert!(parse_record(br#"{"lat": 1.0}"#).is_none());
        assert!(parse_record(br#"[1, 2, 3]"#).is_none());
        assert!(parse_record(b"not json").is_none());
    }

    #[test]
    fn skips_non_scalar_members() {
        let payload = br#"{"type": "GPS", "lat": 1.0, "covariance": [0.1, 0.2]}"#;
        let record = parse_record(payload).unwrap();
        assert_eq!(record.field("lat"), Some(&FieldValue::Float(1.0)));
        assert_eq!(record.field("covariance"), None);
    }
}
