//! Start/complete/fail bookkeeping shared by the use cases.

use serde_json::Value;
use skucode_ports::{LogFields, LoggerPort, TelemetryPort, TelemetryTimer};
use skucode_shared::{ErrorEnvelope, Result};
use std::time::Instant;

/// One observed use-case run.
///
/// Emits `coding.<use_case>.start` on creation, then exactly one of
/// `completed`, `failed` or `aborted` from [`UseCaseRun::finish`], along with
/// the matching counter and the `total` timer.
pub struct UseCaseRun<'a> {
    use_case: &'static str,
    label: &'static str,
    logger: Option<&'a dyn LoggerPort>,
    telemetry: Option<&'a dyn TelemetryPort>,
    started_at: Instant,
    total_timer: Option<Box<dyn TelemetryTimer>>,
    fields: LogFields,
}

impl<'a> UseCaseRun<'a> {
    pub fn start(
        use_case: &'static str,
        label: &'static str,
        logger: Option<&'a dyn LoggerPort>,
        telemetry: Option<&'a dyn TelemetryPort>,
        fields: LogFields,
    ) -> Self {
        let run = Self {
            use_case,
            label,
            logger,
            telemetry,
            started_at: Instant::now(),
            total_timer: telemetry
                .map(|telemetry| telemetry.start_timer(&event_name(use_case, "total"), None)),
            fields,
        };
        if let Some(logger) = run.logger {
            logger.info(
                &run.event("start"),
                &format!("{} started", run.label),
                Some(run.fields.clone()),
            );
        }
        run
    }

    pub fn event(&self, suffix: &str) -> String {
        event_name(self.use_case, suffix)
    }

    /// Warn-level event carrying the run's base fields plus `extra`.
    pub fn warn(&self, suffix: &str, message: &str, extra: LogFields) {
        if let Some(logger) = self.logger {
            let mut fields = self.fields.clone();
            fields.extend(extra);
            logger.warn(&self.event(suffix), message, Some(fields));
        }
    }

    pub fn count(&self, suffix: &str) {
        if let Some(telemetry) = self.telemetry {
            telemetry.increment_counter(&self.event(suffix), 1, None);
        }
    }

    /// Close the run; `completed` adds result-specific fields on success.
    pub fn finish<T>(self, result: Result<T>, completed: impl FnOnce(&T) -> LogFields) -> Result<T> {
        if let Some(timer) = self.total_timer.as_ref() {
            timer.stop();
        }
        let duration_ms = duration_ms(self.started_at);

        match result {
            Ok(value) => {
                self.count("executed");
                if let Some(logger) = self.logger {
                    let mut fields = self.fields.clone();
                    fields.extend(completed(&value));
                    fields.insert("durationMs".into(), Value::from(duration_ms));
                    logger.info(
                        &self.event("completed"),
                        &format!("{} completed", self.label),
                        Some(fields),
                    );
                }
                Ok(value)
            },
            Err(error) if error.is_cancelled() => {
                self.count("aborted");
                if let Some(logger) = self.logger {
                    logger.info(
                        &self.event("aborted"),
                        &format!("{} aborted", self.label),
                        Some(LogFields::from([(
                            "durationMs".into(),
                            Value::from(duration_ms),
                        )])),
                    );
                }
                Err(error)
            },
            Err(error) => {
                self.count("failed");
                if let Some(logger) = self.logger {
                    logger.error(
                        &self.event("failed"),
                        &format!("{} failed", self.label),
                        Some(error_fields(self.fields.clone(), duration_ms, &error)),
                    );
                }
                Err(error)
            },
        }
    }
}

fn event_name(use_case: &str, suffix: &str) -> String {
    format!("coding.{use_case}.{suffix}")
}

pub fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub fn error_code_field(error: &ErrorEnvelope) -> (Box<str>, Value) {
    ("errorCode".into(), Value::String(error.code.to_string()))
}

fn error_fields(mut fields: LogFields, duration_ms: u64, error: &ErrorEnvelope) -> LogFields {
    fields.insert("durationMs".into(), Value::from(duration_ms));
    fields.insert("error".into(), Value::String(error.to_string()));
    let (key, code) = error_code_field(error);
    fields.insert(key, code);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use skucode_shared::ErrorCode;
    use skucode_testkit::in_memory::{RecordingLogger, RecordingTelemetry};

    fn run<'a>(
        logger: &'a RecordingLogger,
        telemetry: &'a RecordingTelemetry,
    ) -> UseCaseRun<'a> {
        UseCaseRun::start(
            "sample",
            "Sample",
            Some(logger),
            Some(telemetry),
            LogFields::from([("categoryId".into(), Value::from(2))]),
        )
    }

    #[test]
    fn success_logs_completed_with_duration() -> Result<()> {
        let logger = RecordingLogger::default();
        let telemetry = RecordingTelemetry::default();

        let value = run(&logger, &telemetry).finish(Ok(7), |value| {
            LogFields::from([("value".into(), Value::from(*value))])
        })?;

        assert_eq!(value, 7);
        assert_eq!(
            logger.event_names(),
            vec!["coding.sample.start", "coding.sample.completed"]
        );
        let completed = logger.events().pop().and_then(|event| event.fields);
        let completed = completed.unwrap_or_default();
        assert_eq!(completed.get("value"), Some(&Value::from(7)));
        assert_eq!(completed.get("categoryId"), Some(&Value::from(2)));
        assert!(completed.contains_key("durationMs"));
        assert_eq!(telemetry.counter("coding.sample.executed"), 1);
        assert_eq!(telemetry.timers(), vec!["coding.sample.total".to_owned()]);
        Ok(())
    }

    #[test]
    fn failures_and_cancellations_use_distinct_counters() {
        let logger = RecordingLogger::default();
        let telemetry = RecordingTelemetry::default();

        let failed: Result<()> = run(&logger, &telemetry).finish(
            Err(ErrorEnvelope::expected(ErrorCode::invalid_input(), "bad")),
            |_| LogFields::new(),
        );
        let aborted: Result<()> = run(&logger, &telemetry)
            .finish(Err(ErrorEnvelope::cancelled("stop")), |_| LogFields::new());

        assert!(failed.is_err());
        assert!(aborted.is_err());
        assert_eq!(telemetry.counter("coding.sample.failed"), 1);
        assert_eq!(telemetry.counter("coding.sample.aborted"), 1);
        assert!(logger.has_event("coding.sample.failed"));
        assert!(logger.has_event("coding.sample.aborted"));
    }
}
