//! Family-code command handler.

use crate::commands::coding::{CodingCommandInput, CodingSession, block_on};
use crate::error::CliError;
use crate::format::{CliOutput, OutputMode, format_error_output, format_success};
use skucode_app::{
    GenerateFamilyCodeDeps, GenerateFamilyCodeInput, GenerateFamilyCodeOutput,
    generate_family_code,
};
use skucode_shared::{RequestContext, Result};

/// Run the family-code command.
pub fn run_family_code(
    mode: OutputMode,
    input: &CodingCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_request();
    match block_on(&ctx, family_code(mode, &ctx, input)) {
        Ok(output) => format_family_code_output(mode, &output),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

async fn family_code(
    mode: OutputMode,
    ctx: &RequestContext,
    input: &CodingCommandInput<'_>,
) -> Result<GenerateFamilyCodeOutput> {
    let metadata = input.metadata()?;
    let session = CodingSession::open(mode, ctx, input.catalog, input.config).await?;
    let deps = GenerateFamilyCodeDeps {
        catalog: session.catalog,
        settings: session.settings,
        logger: session.logger,
        telemetry: session.telemetry,
    };
    generate_family_code(
        &session.ctx,
        &deps,
        GenerateFamilyCodeInput {
            category_id: input.category_id(),
            metadata,
        },
    )
    .await
}

fn format_family_code_output(
    mode: OutputMode,
    output: &GenerateFamilyCodeOutput,
) -> Result<CliOutput, CliError> {
    let text = format!(
        "familyCode: {}\ntemplate: {}\ntemplateCategory: {}\n",
        output.family_code,
        output.template,
        output
            .template_category_id
            .map_or_else(|| "default".to_owned(), |id| id.to_string()),
    );
    Ok(format_success(mode, "family-code", serde_json::to_value(output)?, text))
}
