//! Counters and timings emitted by use cases.

use std::collections::BTreeMap;

/// Low-cardinality tags attached to a metric.
pub type TelemetryTags = BTreeMap<Box<str>, Box<str>>;

/// Running timer; records its elapsed time once stopped.
pub trait TelemetryTimer: Send + Sync {
    /// Stop the timer and record its duration.
    fn stop(&self);
}

/// Boundary contract for telemetry.
pub trait TelemetryPort: Send + Sync {
    /// Add `value` to the counter `name`.
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>);

    /// Record a duration in milliseconds.
    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>);

    /// Start a timer that records under `name` when stopped.
    fn start_timer(&self, name: &str, tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer>;
}
