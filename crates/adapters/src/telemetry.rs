//! Counters and timers written as JSON metric lines.

use crate::log_sink::{LogSink, timestamp_ms};
use serde_json::{Value, json};
use skucode_ports::{TelemetryPort, TelemetryTags, TelemetryTimer};
use skucode_shared::{REDACTED, RequestContext, is_secret_key};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// [`TelemetryPort`] emitting `{type: "metric", metricType, name, value, unit?, tags?}` lines.
#[derive(Clone)]
pub struct JsonTelemetry {
    sink: Arc<dyn LogSink>,
    tags: TelemetryTags,
}

impl JsonTelemetry {
    /// Telemetry without default tags.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            tags: TelemetryTags::new(),
        }
    }

    /// Telemetry whose metrics are tagged with the request's `correlationId`.
    #[must_use]
    pub fn for_request(&self, ctx: &RequestContext) -> Self {
        let mut tags = self.tags.clone();
        tags.insert("correlationId".into(), ctx.correlation_id().as_str().into());
        Self {
            sink: Arc::clone(&self.sink),
            tags,
        }
    }

    fn tags_with(&self, extra: Option<&TelemetryTags>) -> TelemetryTags {
        self.tags
            .iter()
            .chain(extra.into_iter().flatten())
            .map(|(key, value)| {
                let value = if is_secret_key(key) { REDACTED.into() } else { value.clone() };
                (key.clone(), value)
            })
            .collect()
    }
}

impl TelemetryPort for JsonTelemetry {
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>) {
        let metric = Metric::Counter { value };
        metric.emit(&*self.sink, name, &self.tags_with(tags));
    }

    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>) {
        let metric = Metric::Timer { duration_ms };
        metric.emit(&*self.sink, name, &self.tags_with(tags));
    }

    fn start_timer(&self, name: &str, tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(RunningTimer {
            sink: Arc::clone(&self.sink),
            name: name.into(),
            tags: self.tags_with(tags),
            started_at: Instant::now(),
            stopped: AtomicBool::new(false),
        })
    }
}

/// Timer that records once, on its first `stop`.
struct RunningTimer {
    sink: Arc<dyn LogSink>,
    name: Box<str>,
    tags: TelemetryTags,
    started_at: Instant,
    stopped: AtomicBool,
}

impl TelemetryTimer for RunningTimer {
    fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let duration_ms = u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        Metric::Timer { duration_ms }.emit(&*self.sink, &self.name, &self.tags);
    }
}

#[derive(Debug, Clone, Copy)]
enum Metric {
    Counter { value: u64 },
    Timer { duration_ms: u64 },
}

impl Metric {
    fn emit(self, sink: &dyn LogSink, name: &str, tags: &TelemetryTags) {
        let mut line = json!({
            "type": "metric",
            "timestampMs": timestamp_ms(),
            "name": name,
        });
        match self {
            Self::Counter { value } => {
                line["metricType"] = Value::from("counter");
                line["value"] = Value::from(value);
            },
            Self::Timer { duration_ms } => {
                line["metricType"] = Value::from("timer");
                line["value"] = Value::from(duration_ms);
                line["unit"] = Value::from("ms");
            },
        }
        if !tags.is_empty() {
            line["tags"] = tags
                .iter()
                .map(|(key, value)| (key.to_string(), Value::from(&**value)))
                .collect();
        }
        sink.write_json(&line);
    }
}
