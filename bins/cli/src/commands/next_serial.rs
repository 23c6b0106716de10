//! Next-serial command handler.

use crate::commands::coding::{block_on, request_observers};
use crate::error::CliError;
use crate::format::{CliOutput, OutputMode, format_error_output, format_success};
use skucode_adapters::{LocalProductStore, read_catalog_snapshot};
use skucode_app::{
    NextSerialPreviewDeps, NextSerialPreviewInput, NextSerialPreviewOutput, next_serial_preview,
};
use skucode_shared::{RequestContext, Result};
use std::path::Path;
use std::sync::Arc;

/// Run the next-serial command.
pub fn run_next_serial(
    mode: OutputMode,
    catalog: &Path,
    prefix: &str,
) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_request();
    match block_on(&ctx, next_serial(mode, &ctx, catalog, prefix)) {
        Ok(output) => format_next_serial_output(mode, &output),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

async fn next_serial(
    mode: OutputMode,
    ctx: &RequestContext,
    catalog: &Path,
    prefix: &str,
) -> Result<NextSerialPreviewOutput> {
    let snapshot = read_catalog_snapshot(catalog).await?;
    let (logger, telemetry) = request_observers(mode, ctx);
    let deps = NextSerialPreviewDeps {
        store: Arc::new(LocalProductStore::from_snapshot(&snapshot)),
        logger,
        telemetry,
    };
    next_serial_preview(
        ctx,
        &deps,
        NextSerialPreviewInput {
            prefix: prefix.into(),
        },
    )
    .await
}

fn format_next_serial_output(
    mode: OutputMode,
    output: &NextSerialPreviewOutput,
) -> Result<CliOutput, CliError> {
    let text = format!(
        "prefix: {}\nmaxIssued: {}\nnextSerial: {}\n",
        output.prefix,
        output
            .max_issued
            .map_or_else(|| "none".to_owned(), |max| max.to_string()),
        output.next_serial,
    );
    Ok(format_success(mode, "next-serial", serde_json::to_value(output)?, text))
}
