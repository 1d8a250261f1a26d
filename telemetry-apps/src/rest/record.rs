//! Telemetry record and snapshot types.
//!
//! A snapshot is the full set of latest known records at a point in
//! time, keyed by message name. Records are immutable once sampled and
//! replaced wholesale on every refresh, never mutated in place.

use std::collections::HashMap;

/// A single scalar field value carried by a telemetry record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    UInt(u64),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Text form used by the JSON projection.
    ///
    /// Floats use debug formatting so integral values keep their
    /// trailing `.0`, matching the upstream text form. Byte payloads
    /// must decode as UTF-8.
    pub fn to_text(&self) -> Result<String, std::str::Utf8Error> {
        match self {
            FieldValue::Float(v) => Ok(format!("{v:?}")),
            FieldValue::Int(v) => Ok(v.to_string()),
            FieldValue::UInt(v) => Ok(v.to_string()),
            FieldValue::Bool(v) => Ok(v.to_string()),
            FieldValue::Text(v) => Ok(v.clone()),
            FieldValue::Bytes(v) => std::str::from_utf8(v).map(str::to_string),
        }
    }
}

/// One telemetry message: a name plus its ordered named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub message: String,
    pub fields: Vec<(String, FieldValue)>,
}

impl TelemetryRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The latest known record per message name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    records: HashMap<String, TelemetryRecord>,
}

impl TelemetrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its own message name, replacing any
    /// previous record for that message.
    pub fn insert(&mut self, record: TelemetryRecord) {
        self.records.insert(record.message.clone(), record);
    }

    pub fn get(&self, message: &str) -> Option<&TelemetryRecord> {
        self.records.get(message)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TelemetryRecord)> {
        self.records.iter()
    }
}

/// Trait implemented by whatever owns the live telemetry.
///
/// Sampling is only invoked by the snapshot store's refresh tick, so
/// implementations may take their own locks without worrying about
/// per-request contention.
pub trait TelemetrySource: Send + Sync {
    /// Sample the latest known records.
    fn sample(&self) -> TelemetrySnapshot;
}
