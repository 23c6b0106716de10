//! Preview command handler.

use crate::commands::coding::{CodingCommandInput, CodingSession, block_on};
use crate::error::CliError;
use crate::format::{CliOutput, OutputMode, format_error_output, format_success};
use skucode_adapters::LocalProductStore;
use skucode_app::{
    PreviewVariantCodesDeps, PreviewVariantCodesInput, PreviewVariantCodesOutput,
    preview_variant_codes,
};
use skucode_domain::VariantCodes;
use skucode_shared::{RequestContext, Result};
use std::fmt::Write as _;
use std::sync::Arc;

/// Run the preview command.
pub fn run_preview(mode: OutputMode, input: &CodingCommandInput<'_>) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_request();
    match block_on(&ctx, preview(mode, &ctx, input)) {
        Ok(output) => format_preview_output(mode, &output),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

async fn preview(
    mode: OutputMode,
    ctx: &RequestContext,
    input: &CodingCommandInput<'_>,
) -> Result<PreviewVariantCodesOutput> {
    let metadata = input.metadata()?;
    let variants = input.variants()?;
    let session = CodingSession::open(mode, ctx, input.catalog, input.config).await?;
    let deps = PreviewVariantCodesDeps {
        store: Arc::new(LocalProductStore::from_snapshot(&session.snapshot)),
        catalog: session.catalog,
        settings: session.settings,
        logger: session.logger,
        telemetry: session.telemetry,
    };
    preview_variant_codes(
        &session.ctx,
        &deps,
        PreviewVariantCodesInput {
            category_id: input.category_id(),
            metadata,
            variants,
        },
    )
    .await
}

fn format_preview_output(
    mode: OutputMode,
    output: &PreviewVariantCodesOutput,
) -> Result<CliOutput, CliError> {
    let mut text = format!(
        "familyCode: {}\nprefix: {}\nfamilyExists: {}\n",
        output.family_code, output.prefix, output.family_exists
    );
    push_variant_lines(&mut text, &output.variants);
    Ok(format_success(mode, "preview", serde_json::to_value(output)?, text))
}

/// One `variant:` line per coded variant, in input order.
pub fn push_variant_lines(text: &mut String, variants: &[VariantCodes]) {
    for codes in variants {
        let _ = writeln!(
            text,
            "variant: {} {}",
            codes.short_code, codes.feature_code
        );
    }
}
