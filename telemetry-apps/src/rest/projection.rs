//! Projection of telemetry records into JSON trees.
//!
//! The aggregate is built with a key-ordered [`serde_json::Map`], so
//! there is no trailing-separator trimming and a record with zero
//! fields simply projects to an empty object.

use serde_json::{Map, Value};
use thiserror::Error;

use super::record::{TelemetryRecord, TelemetrySnapshot};

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("no telemetry data available")]
    NoData,
    #[error("field {message}.{field} is not valid UTF-8")]
    InvalidFieldEncoding { message: String, field: String },
}

/// Project the named fields of one record into a JSON object mapping
/// each field name to the text form of its value.
pub fn project_fields(record: &TelemetryRecord) -> Result<Value, ProjectionError> {
    let mut fields = Map::new();
    for (name, value) in &record.fields {
        let text = value
            .to_text()
            .map_err(|_| ProjectionError::InvalidFieldEncoding {
                message: record.message.clone(),
                field: name.clone(),
            })?;
        fields.insert(name.clone(), Value::String(text));
    }
    Ok(Value::Object(fields))
}

/// Project one record as a single-key object under its message name.
pub fn project_record(record: &TelemetryRecord) -> Result<Value, ProjectionError> {
    let mut root = Map::new();
    root.insert(record.message.clone(), project_fields(record)?);
    Ok(Value::Object(root))
}

/// Project a full snapshot into one aggregate JSON object, one entry
/// per record under its message name.
///
/// An absent or empty snapshot is not a serialization - it is reported
/// as [`ProjectionError::NoData`]. A non-empty snapshot never drops
/// entries: any field that fails to render fails the whole projection.
pub fn project_snapshot(snapshot: &TelemetrySnapshot) -> Result<Value, ProjectionError> {
    if snapshot.is_empty() {
        return Err(ProjectionError::NoData);
    }

    let mut root = Map::new();
    for (message, record) in snapshot.iter() {
        root.insert(message.clone(), project_fields(record)?);
    }
    Ok(Value::Object(root))
}
