//! Structured logger writing one JSON object per event.

use crate::log_sink::{LogSink, timestamp_ms};
use serde_json::{Map, Value, json};
use skucode_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use skucode_shared::{REDACTED, RequestContext, is_secret_key};
use std::sync::Arc;

/// [`LoggerPort`] rendering `{timestampMs, level, event, message, fields?, error?}` lines.
///
/// Fields whose names look like credentials are replaced by [`REDACTED`] at any depth.
#[derive(Clone)]
pub struct JsonLogger {
    sink: Arc<dyn LogSink>,
    scope: LogFields,
    min_level: LogLevel,
}

impl JsonLogger {
    /// Logger at `info` level with no scope fields.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            scope: LogFields::new(),
            min_level: LogLevel::Info,
        }
    }

    /// Drop events below `level`.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Logger whose events carry the request's `correlationId`.
    #[must_use]
    pub fn for_request(&self, ctx: &RequestContext) -> Self {
        self.scoped(LogFields::from([(
            "correlationId".into(),
            Value::from(ctx.correlation_id().as_str()),
        )]))
    }

    fn scoped(&self, fields: LogFields) -> Self {
        let mut scope = self.scope.clone();
        scope.extend(fields);
        Self {
            sink: Arc::clone(&self.sink),
            scope,
            min_level: self.min_level,
        }
    }
}

impl LoggerPort for JsonLogger {
    fn log(&self, event: LogEvent) {
        if event.level < self.min_level {
            return;
        }

        let fields: Map<String, Value> = self
            .scope
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .chain(
                event
                    .fields
                    .into_iter()
                    .flatten()
                    .map(|(key, value)| (key.into_string(), value)),
            )
            .collect();
        let mut line = json!({
            "timestampMs": timestamp_ms(),
            "level": event.level.as_str(),
            "event": &*event.event,
            "message": &*event.message,
        });
        if !fields.is_empty() {
            line["fields"] = Value::Object(fields);
        }
        if let Some(error) = event.error {
            line["error"] = error;
        }
        redact(&mut line);
        self.sink.write_json(&line);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(self.scoped(fields))
    }
}

/// Parse a level name (`debug`, `info`, `warn`, `error`), case-insensitively.
#[must_use]
pub fn parse_log_level(raw: &str) -> Option<LogLevel> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "debug" | "trace" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" | "warning" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}

fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                if is_secret_key(key) {
                    *nested = Value::from(REDACTED);
                } else {
                    redact(nested);
                }
            }
        },
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {},
    }
}
