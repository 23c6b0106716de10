//! Generate and persist a family with its variants, retrying on collisions.

use crate::observe::{UseCaseRun, error_code_field};
use crate::pipeline::{VariantBatch, code_variants};
use crate::settings::CodingSettings;
use serde::Serialize;
use serde_json::Value;
use skucode_domain::{
    CategoryId, CodingMetadata, ProductFamily, ShortCodePrefix, VariantAttributes, VariantCodes,
};
use skucode_ports::{
    CatalogPort, CommitOutcome, FamilyCommit, LogFields, LoggerPort, ProductStorePort,
    TelemetryPort,
};
use skucode_shared::{RequestContext, Result, retry_with_backoff};
use std::sync::Arc;

/// Input payload for a commit.
#[derive(Debug, Clone)]
pub struct CommitProductFamilyInput {
    /// Category of the family.
    pub category_id: CategoryId,
    /// Family coding metadata; stored on a newly created family.
    pub metadata: CodingMetadata,
    /// Human-readable attribute sets, one per variant.
    pub variants: Vec<VariantAttributes>,
}

/// Dependencies required by the commit.
#[derive(Clone)]
pub struct CommitProductFamilyDeps {
    /// Catalog adapter.
    pub catalog: Arc<dyn CatalogPort>,
    /// Product store enforcing short-code uniqueness.
    pub store: Arc<dyn ProductStorePort>,
    /// Engine settings; `settings.retry` bounds collision retries.
    pub settings: CodingSettings,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// What the commit persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitProductFamilyOutput {
    /// Rendered family code.
    pub family_code: Box<str>,
    /// Short-code prefix of the family.
    pub prefix: ShortCodePrefix,
    /// The family was created by this commit.
    pub family_created: bool,
    /// Variants inserted.
    pub created: usize,
    /// Existing variants updated in place.
    pub merged: usize,
    /// Generation attempts, including the successful one.
    pub attempts: u32,
    /// Codes per input variant, in input order.
    pub variants: Vec<VariantCodes>,
}

/// Regenerate codes and persist them; a short-code collision re-runs generation.
///
/// Each attempt reads the store again, so a retry observes serials committed
/// concurrently by other callers.
#[tracing::instrument(
    skip_all,
    fields(category_id = %input.category_id, variants = input.variants.len())
)]
pub async fn commit_product_family(
    ctx: &RequestContext,
    deps: &CommitProductFamilyDeps,
    input: CommitProductFamilyInput,
) -> Result<CommitProductFamilyOutput> {
    let run = UseCaseRun::start(
        "commit_product_family",
        "Commit product family",
        deps.logger.as_deref(),
        deps.telemetry.as_deref(),
        LogFields::from([
            ("categoryId".into(), Value::from(input.category_id.get())),
            ("variantCount".into(), Value::from(input.variants.len())),
        ]),
    );

    let result: Result<CommitProductFamilyOutput> = (async {
        ctx.ensure_not_cancelled("commit_product_family.start")?;
        let mut retries = 0u32;
        let (batch, outcome) = retry_with_backoff(
            ctx,
            deps.settings.retry,
            "commit_product_family.attempt",
            || generate_and_commit(ctx, deps, &input),
            |attempt, error| {
                retries = attempt;
                run.count("retry");
                let (key, code) = error_code_field(error);
                run.warn(
                    "retry",
                    "Short code collision, regenerating",
                    LogFields::from([
                        ("attempt".into(), Value::from(attempt)),
                        (key, code),
                        ("error".into(), Value::String(error.message.clone())),
                    ]),
                );
            },
        )
        .await?;

        Ok(CommitProductFamilyOutput {
            family_code: batch.family_code.into_boxed_str(),
            prefix: batch.prefix,
            family_created: outcome.family_created,
            created: outcome.created,
            merged: outcome.merged,
            attempts: retries.saturating_add(1),
            variants: batch.variants,
        })
    })
    .await;

    run.finish(result, |output| {
        LogFields::from([
            ("familyCode".into(), Value::from(output.family_code.as_ref())),
            ("familyCreated".into(), Value::from(output.family_created)),
            ("created".into(), Value::from(output.created)),
            ("merged".into(), Value::from(output.merged)),
            ("attempts".into(), Value::from(output.attempts)),
        ])
    })
}

async fn generate_and_commit(
    ctx: &RequestContext,
    deps: &CommitProductFamilyDeps,
    input: &CommitProductFamilyInput,
) -> Result<(VariantBatch, CommitOutcome)> {
    let batch = code_variants(
        ctx,
        deps.catalog.as_ref(),
        deps.store.as_ref(),
        &deps.settings,
        input.category_id,
        &input.metadata,
        &input.variants,
    )
    .await?;

    ctx.ensure_not_cancelled("commit_product_family.commit")?;
    let commit = FamilyCommit {
        family: ProductFamily {
            family_code: batch.family_code.as_str().into(),
            category_id: input.category_id,
            coding_metadata: input.metadata.clone(),
        },
        variants: batch
            .variants
            .iter()
            .map(|codes| codes.to_variant(&batch.family_code))
            .collect(),
    };
    let outcome = deps.store.commit_family(ctx, commit).await?;
    Ok((batch, outcome))
}
