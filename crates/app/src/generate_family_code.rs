//! Render the family code of a category + metadata pair.

use crate::observe::UseCaseRun;
use crate::pipeline::render_family;
use crate::settings::CodingSettings;
use serde::Serialize;
use serde_json::Value;
use skucode_domain::{CategoryId, CodingMetadata, TemplateSource};
use skucode_ports::{CatalogPort, LogFields, LoggerPort, TelemetryPort};
use skucode_shared::{RequestContext, Result};
use std::sync::Arc;

/// Input payload for family-code generation.
#[derive(Debug, Clone)]
pub struct GenerateFamilyCodeInput {
    /// Category the family belongs to.
    pub category_id: CategoryId,
    /// Coding metadata (brand, model, fitment years, extra template keys).
    pub metadata: CodingMetadata,
}

/// Dependencies required by family-code generation.
#[derive(Clone)]
pub struct GenerateFamilyCodeDeps {
    /// Catalog adapter.
    pub catalog: Arc<dyn CatalogPort>,
    /// Engine settings.
    pub settings: CodingSettings,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// Rendered family code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFamilyCodeOutput {
    /// Rendered family code.
    pub family_code: Box<str>,
    /// Template the code was rendered from.
    pub template: Box<str>,
    /// Category that configured `template`; `None` for a business-type default.
    pub template_category_id: Option<CategoryId>,
}

/// Resolve the category template and render the family code.
#[tracing::instrument(skip_all, fields(category_id = %input.category_id))]
pub async fn generate_family_code(
    ctx: &RequestContext,
    deps: &GenerateFamilyCodeDeps,
    input: GenerateFamilyCodeInput,
) -> Result<GenerateFamilyCodeOutput> {
    let run = UseCaseRun::start(
        "generate_family_code",
        "Generate family code",
        deps.logger.as_deref(),
        deps.telemetry.as_deref(),
        LogFields::from([(
            "categoryId".into(),
            Value::from(input.category_id.get()),
        )]),
    );

    let result: Result<GenerateFamilyCodeOutput> = (async {
        ctx.ensure_not_cancelled("generate_family_code.start")?;
        let rendered = render_family(
            ctx,
            deps.catalog.as_ref(),
            &deps.settings,
            input.category_id,
            &input.metadata,
        )
        .await?;

        Ok(GenerateFamilyCodeOutput {
            family_code: rendered.family_code.into_boxed_str(),
            template: rendered.category.template,
            template_category_id: match rendered.category.source {
                TemplateSource::Category(owner) => Some(owner),
                TemplateSource::BusinessTypeDefault(_) => None,
            },
        })
    })
    .await;

    run.finish(result, |output| {
        LogFields::from([(
            "familyCode".into(),
            Value::from(output.family_code.as_ref()),
        )])
    })
}
