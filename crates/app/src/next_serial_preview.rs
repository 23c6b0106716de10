//! Next free serial under a short-code prefix.

use crate::observe::UseCaseRun;
use serde::Serialize;
use serde_json::Value;
use skucode_core::CodeFormat;
use skucode_domain::{CodingError, ShortCodePrefix};
use skucode_ports::{LogFields, LoggerPort, ProductStorePort, TelemetryPort};
use skucode_shared::{RequestContext, Result};
use std::sync::Arc;

/// Input payload for a serial preview.
#[derive(Debug, Clone)]
pub struct NextSerialPreviewInput {
    /// Raw prefix as supplied by the caller.
    pub prefix: Box<str>,
}

/// Dependencies required by the serial preview.
#[derive(Clone)]
pub struct NextSerialPreviewDeps {
    /// Product store.
    pub store: Arc<dyn ProductStorePort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// Serial a new signature would receive under the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSerialPreviewOutput {
    /// Normalized prefix.
    pub prefix: ShortCodePrefix,
    /// Highest serial issued so far, if any.
    pub max_issued: Option<u32>,
    /// Next serial, zero-padded to two digits.
    pub next_serial: Box<str>,
}

/// Report `max issued + 1` under `prefix` without reserving it.
#[tracing::instrument(skip_all, fields(prefix = %input.prefix))]
pub async fn next_serial_preview(
    ctx: &RequestContext,
    deps: &NextSerialPreviewDeps,
    input: NextSerialPreviewInput,
) -> Result<NextSerialPreviewOutput> {
    let run = UseCaseRun::start(
        "next_serial_preview",
        "Next serial preview",
        deps.logger.as_deref(),
        deps.telemetry.as_deref(),
        LogFields::from([("prefix".into(), Value::from(input.prefix.as_ref()))]),
    );

    let result: Result<NextSerialPreviewOutput> = (async {
        ctx.ensure_not_cancelled("next_serial_preview.start")?;
        let prefix = ShortCodePrefix::parse(&input.prefix)?;
        let max_issued = deps
            .store
            .max_serial_for_prefix(ctx, prefix.clone())
            .await?;

        let next = max_issued.map_or(1, |max| max.saturating_add(1));
        if next > CodeFormat::MAX_SERIAL {
            return Err(CodingError::SerialExhausted {
                prefix: prefix.as_str().into(),
            }
            .into());
        }

        Ok(NextSerialPreviewOutput {
            prefix,
            max_issued,
            next_serial: CodeFormat::format_serial(next).into_boxed_str(),
        })
    })
    .await;

    run.finish(result, |output| {
        LogFields::from([(
            "nextSerial".into(),
            Value::from(output.next_serial.as_ref()),
        )])
    })
}
