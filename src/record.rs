use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// A single structured log entry handed to the writer.
///
/// Only `fields` ends up in the file: each record becomes one JSON object
/// on its own line. The remaining metadata travels with the record for
/// callers that build the payload from it (see [`crate::layer`]).
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub fields: BTreeMap<String, serde_json::Value>,
    pub message: Option<String>,
}

impl LogRecord {
    /// Create a record stamped with the current time and an empty payload.
    pub fn new(level: tracing::Level, target: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level: level.to_string(),
            target: target.into(),
            module_path: None,
            file: None,
            line: None,
            fields: BTreeMap::new(),
            message: None,
        }
    }

    /// Add a key/value pair to the payload (chainable).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Encode the payload as a single JSON line, without the separator.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_is_the_only_thing_encoded() {
        let record = LogRecord::new(tracing::Level::INFO, "registry")
            .with_message("user registered")
            .with_field("username", "hhy")
            .with_field("channel", 1);

        let line = record.to_json_line().expect("encode");
        let value: serde_json::Value = serde_json::from_str(&line).expect("decode");
        assert_eq!(value, json!({ "channel": 1, "username": "hhy" }));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn whole_record_serializes_with_metadata() {
        let timestamp = "2024-03-10T08:00:00Z".parse().expect("timestamp");
        let record = LogRecord::new(tracing::Level::WARN, "registry")
            .with_timestamp(timestamp)
            .with_message("slow query")
            .with_field("ms", 820);

        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["target"], "registry");
        assert_eq!(value["message"], "slow query");
        assert_eq!(value["fields"], json!({ "ms": 820 }));
        assert_eq!(value["timestamp"], "2024-03-10T08:00:00Z");
    }
}
