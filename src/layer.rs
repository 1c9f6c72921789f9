use crate::record::LogRecord;
use crate::writer::FileWriter;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Events from this crate's own modules are never written back into the
/// file they describe.
const OWN_TARGET: &str = "rotating_log_sink";

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`FileWriter`].
///
/// Events less severe than `min_level` are ignored. Enqueueing never blocks
/// the application thread: when the writer's queue is full the event is
/// dropped and counted.
///
/// Each line written for an event carries `timestamp`, `level`, `target`,
/// `message` (when present) and every recorded field. Those four keys are
/// taken from the event metadata and replace any event field of the same
/// name.
pub struct FileLogLayer {
    writer: FileWriter,
    min_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into the writer.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the queue was full or the writer had stopped.
    pub dropped_events: Arc<AtomicU64>,
}

impl FileLogLayer {
    pub fn new(writer: FileWriter, min_level: Level) -> Self {
        Self {
            writer,
            min_level,
            total_events: Arc::new(AtomicU64::new(0)),
            enqueued_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<S> Layer<S> for FileLogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if *meta.level() > self.min_level || meta.target().starts_with(OWN_TARGET) {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let timestamp = Utc::now();
        let mut payload = fields;
        payload.insert("timestamp".to_string(), timestamp.to_rfc3339().into());
        payload.insert("level".to_string(), meta.level().as_str().into());
        payload.insert("target".to_string(), meta.target().into());
        if let Some(message) = &message {
            payload.insert("message".to_string(), message.clone().into());
        }

        let record = LogRecord {
            timestamp,
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            module_path: meta.module_path().map(|s| s.to_string()),
            file: meta.file().map(|s| s.to_string()),
            line: meta.line(),
            fields: payload,
            message,
        };

        match self.writer.try_write(record) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
