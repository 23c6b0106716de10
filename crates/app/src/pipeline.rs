//! Catalog lookups feeding the pure coding engine.

use crate::settings::CodingSettings;
use skucode_domain::{
    AttributeResolutions, CategoryArena, CategoryId, CodingMetadata, ResolvedCategory,
    ShortCodePrefix, VariantAttributes, VariantCodes, VariantPlan, brand_reference,
    build_render_context, render_template, vehicle_codes,
};
use skucode_ports::{CatalogPort, ProductStorePort, ProductVariant};
use skucode_shared::{RequestContext, Result};
use std::collections::BTreeSet;

/// Family code plus the category configuration it was rendered with.
#[derive(Debug, Clone)]
pub struct RenderedFamily {
    pub family_code: String,
    pub category: ResolvedCategory,
}

/// Codes for a batch of variants of one family.
#[derive(Debug, Clone)]
pub struct VariantBatch {
    pub family_code: String,
    pub prefix: ShortCodePrefix,
    pub family_exists: bool,
    pub variants: Vec<VariantCodes>,
}

pub async fn render_family(
    ctx: &RequestContext,
    catalog: &dyn CatalogPort,
    settings: &CodingSettings,
    category_id: CategoryId,
    metadata: &CodingMetadata,
) -> Result<RenderedFamily> {
    let lineage = catalog
        .category_lineage(ctx, category_id, settings.max_parent_depth)
        .await?;
    let arena = CategoryArena::from_categories(lineage);
    let category = arena.resolve(category_id, settings.max_parent_depth)?;

    let brand_node = match brand_reference(metadata) {
        Some(node_id) => catalog.vehicle_node(ctx, node_id).await?,
        None => None,
    };
    let context = build_render_context(
        category.abbreviation.as_deref(),
        metadata,
        brand_node.as_ref(),
    );
    let family_code = render_template(&category.template, &context)?;
    tracing::debug!(%category_id, family_code = %family_code, "family code rendered");

    Ok(RenderedFamily {
        family_code,
        category,
    })
}

/// Render the family code, then assign serials and codes to `variants`.
///
/// Serials already persisted for the family are reused per invisible
/// signature; new signatures continue above the prefix maximum.
pub async fn code_variants(
    ctx: &RequestContext,
    catalog: &dyn CatalogPort,
    store: &dyn ProductStorePort,
    settings: &CodingSettings,
    category_id: CategoryId,
    metadata: &CodingMetadata,
    variants: &[VariantAttributes],
) -> Result<VariantBatch> {
    let rendered = render_family(ctx, catalog, settings, category_id, metadata).await?;
    let family_code = rendered.family_code;

    let (make_code, model_code) = vehicle_codes(metadata);
    let prefix = ShortCodePrefix::compose(
        settings.category_code(rendered.category.short_code.as_deref()),
        make_code.as_deref(),
        model_code.as_deref(),
    );

    ctx.ensure_not_cancelled("coding.existing_family")?;
    let family_exists = store
        .find_family(ctx, family_code.as_str().into())
        .await?
        .is_some();
    let existing = if family_exists {
        store
            .family_variants(ctx, family_code.as_str().into())
            .await?
    } else {
        Vec::new()
    };

    let keys = attribute_keys(variants, &existing);
    let definitions = catalog.attribute_definitions(ctx, keys.clone()).await?;
    let overrides = catalog
        .category_overrides(ctx, category_id, keys)
        .await?;
    let resolutions = AttributeResolutions::resolve(category_id, &definitions, &overrides);

    let max_issued = store.max_serial_for_prefix(ctx, prefix.clone()).await?;
    let plan = VariantPlan {
        family_code: &family_code,
        prefix: &prefix,
        resolutions: &resolutions,
        extractor: &settings.extractor,
    };
    let mut ledger = plan.ledger(&existing, max_issued);
    let coded = plan.assign(variants, &mut ledger)?;
    tracing::debug!(
        prefix = %prefix,
        existing = existing.len(),
        max_issued = ?max_issued,
        coded = coded.len(),
        "variant codes assigned"
    );

    Ok(VariantBatch {
        family_code,
        prefix,
        family_exists,
        variants: coded,
    })
}

/// Attribute keys of the new variants and of the family's persisted ones.
///
/// Persisted variants need their definitions too, so their signatures can be
/// matched against the new batch.
fn attribute_keys(variants: &[VariantAttributes], existing: &[ProductVariant]) -> Vec<Box<str>> {
    variants
        .iter()
        .chain(existing.iter().map(|variant| &variant.attribute_values))
        .flat_map(|attributes| attributes.keys())
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(Box::from)
        .collect()
}
