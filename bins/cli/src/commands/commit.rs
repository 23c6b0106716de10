//! Commit command handler.

use crate::commands::coding::{CodingCommandInput, CodingSession, block_on};
use crate::commands::preview::push_variant_lines;
use crate::error::CliError;
use crate::format::{CliOutput, OutputMode, format_error_output, format_success};
use skucode_adapters::LocalProductStore;
use skucode_app::{
    CommitProductFamilyDeps, CommitProductFamilyInput, CommitProductFamilyOutput,
    commit_product_family,
};
use skucode_shared::{RequestContext, Result};
use std::sync::Arc;

/// Run the commit command.
///
/// Without `save` the commit lands in an in-memory store seeded from the
/// snapshot; with it the snapshot file is rewritten after the commit.
pub fn run_commit(
    mode: OutputMode,
    input: &CodingCommandInput<'_>,
    save: bool,
) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_request();
    match block_on(&ctx, commit(mode, &ctx, input, save)) {
        Ok(output) => format_commit_output(mode, &output, save),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

async fn commit(
    mode: OutputMode,
    ctx: &RequestContext,
    input: &CodingCommandInput<'_>,
    save: bool,
) -> Result<CommitProductFamilyOutput> {
    let metadata = input.metadata()?;
    let variants = input.variants()?;
    let session = CodingSession::open(mode, ctx, input.catalog, input.config).await?;
    let mut store = LocalProductStore::from_snapshot(&session.snapshot);
    if save {
        store = store.persist_to(input.catalog.to_path_buf(), &session.snapshot);
    }

    let deps = CommitProductFamilyDeps {
        catalog: session.catalog,
        store: Arc::new(store),
        settings: session.settings,
        logger: session.logger,
        telemetry: session.telemetry,
    };
    commit_product_family(
        &session.ctx,
        &deps,
        CommitProductFamilyInput {
            category_id: input.category_id(),
            metadata,
            variants,
        },
    )
    .await
}

fn format_commit_output(
    mode: OutputMode,
    output: &CommitProductFamilyOutput,
    saved: bool,
) -> Result<CliOutput, CliError> {
    let mut text = format!(
        "familyCode: {}\nprefix: {}\nfamilyCreated: {}\ncreated: {}\nmerged: {}\nattempts: {}\nsaved: {saved}\n",
        output.family_code,
        output.prefix,
        output.family_created,
        output.created,
        output.merged,
        output.attempts,
    );
    push_variant_lines(&mut text, &output.variants);

    let mut payload = serde_json::to_value(output)?;
    if let serde_json::Value::Object(map) = &mut payload {
        map.insert("saved".to_owned(), serde_json::Value::Bool(saved));
    }
    Ok(format_success(mode, "commit", payload, text))
}
