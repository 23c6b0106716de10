//! Preview short and feature codes for a batch of variants without persisting.

use crate::observe::UseCaseRun;
use crate::pipeline::code_variants;
use crate::settings::CodingSettings;
use serde::Serialize;
use serde_json::Value;
use skucode_domain::{
    CategoryId, CodingMetadata, ShortCodePrefix, VariantAttributes, VariantCodes,
};
use skucode_ports::{CatalogPort, LogFields, LoggerPort, ProductStorePort, TelemetryPort};
use skucode_shared::{RequestContext, Result};
use std::sync::Arc;

/// Input payload for a variant preview.
#[derive(Debug, Clone)]
pub struct PreviewVariantCodesInput {
    /// Category of the family.
    pub category_id: CategoryId,
    /// Family coding metadata.
    pub metadata: CodingMetadata,
    /// Human-readable attribute sets, one per variant.
    pub variants: Vec<VariantAttributes>,
}

/// Dependencies required by the preview.
#[derive(Clone)]
pub struct PreviewVariantCodesDeps {
    /// Catalog adapter.
    pub catalog: Arc<dyn CatalogPort>,
    /// Product store (read only here).
    pub store: Arc<dyn ProductStorePort>,
    /// Engine settings.
    pub settings: CodingSettings,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// Codes that a commit with the same input would persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewVariantCodesOutput {
    /// Rendered family code.
    pub family_code: Box<str>,
    /// Short-code prefix of the family.
    pub prefix: ShortCodePrefix,
    /// Whether the family code is already persisted.
    pub family_exists: bool,
    /// Codes per input variant, in input order.
    pub variants: Vec<VariantCodes>,
}

/// Generate the family code and the codes of every variant.
#[tracing::instrument(
    skip_all,
    fields(category_id = %input.category_id, variants = input.variants.len())
)]
pub async fn preview_variant_codes(
    ctx: &RequestContext,
    deps: &PreviewVariantCodesDeps,
    input: PreviewVariantCodesInput,
) -> Result<PreviewVariantCodesOutput> {
    let run = UseCaseRun::start(
        "preview_variant_codes",
        "Preview variant codes",
        deps.logger.as_deref(),
        deps.telemetry.as_deref(),
        LogFields::from([
            ("categoryId".into(), Value::from(input.category_id.get())),
            ("variantCount".into(), Value::from(input.variants.len())),
        ]),
    );

    let result: Result<PreviewVariantCodesOutput> = (async {
        ctx.ensure_not_cancelled("preview_variant_codes.start")?;
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

        Ok(PreviewVariantCodesOutput {
            family_code: batch.family_code.into_boxed_str(),
            prefix: batch.prefix,
            family_exists: batch.family_exists,
            variants: batch.variants,
        })
    })
    .await;

    run.finish(result, |output| {
        LogFields::from([
            ("familyCode".into(), Value::from(output.family_code.as_ref())),
            ("prefix".into(), Value::from(output.prefix.as_str())),
            ("familyExists".into(), Value::from(output.family_exists)),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skucode_domain::{MetadataValue, ProductFamily, ProductVariant};
    use skucode_testkit::fixtures::{
        HEADLIGHT_FAMILY_CODE, HEADLIGHTS, attributes, headlight_catalog, headlight_metadata,
        headlight_variants,
    };
    use skucode_testkit::in_memory::{InMemoryCatalog, InMemoryProductStore, NoopLogger};

    fn deps(store: InMemoryProductStore) -> PreviewVariantCodesDeps {
        PreviewVariantCodesDeps {
            catalog: Arc::new(InMemoryCatalog::from_fixture(&headlight_catalog())),
            store: Arc::new(store),
            settings: CodingSettings::default(),
            logger: Some(Arc::new(NoopLogger)),
            telemetry: None,
        }
    }

    fn short_codes(output: &PreviewVariantCodesOutput) -> Vec<&str> {
        output
            .variants
            .iter()
            .map(|codes| codes.short_code.as_ref())
            .collect()
    }

    #[tokio::test]
    async fn fresh_family_gets_serials_per_invisible_signature() -> Result<()> {
        let ctx = RequestContext::new_request();
        let output = preview_variant_codes(
            &ctx,
            &deps(InMemoryProductStore::new()),
            PreviewVariantCodesInput {
                category_id: HEADLIGHTS,
                metadata: headlight_metadata(),
                variants: headlight_variants(),
            },
        )
        .await?;

        assert_eq!(output.family_code.as_ref(), HEADLIGHT_FAMILY_CODE);
        assert_eq!(output.prefix.as_str(), "1111234");
        assert!(!output.family_exists);
        assert_eq!(
            short_codes(&output),
            vec!["111123402D", "111123401D", "111123402P"]
        );
        let feature_codes: Vec<&str> = output
            .variants
            .iter()
            .map(|codes| codes.feature_code.as_ref())
            .collect();
        assert_eq!(
            feature_codes,
            vec![
                "HL-TOY-CAMRY-07-13-D-RD",
                "HL-TOY-CAMRY-07-13-D-AM",
                "HL-TOY-CAMRY-07-13-P-RD",
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn single_variant_without_vehicle_codes() -> Result<()> {
        let ctx = RequestContext::new_request();
        let metadata = CodingMetadata::from([
            ("brand".to_owned(), MetadataValue::from("Toyota")),
            ("model".to_owned(), MetadataValue::from("Camry")),
            ("yearStart".to_owned(), MetadataValue::Int(2007)),
            ("yearEnd".to_owned(), MetadataValue::Int(2013)),
        ]);

        let output = preview_variant_codes(
            &ctx,
            &deps(InMemoryProductStore::new()),
            PreviewVariantCodesInput {
                category_id: HEADLIGHTS,
                metadata,
                variants: vec![attributes(&[("position", "Left")])],
            },
        )
        .await?;

        assert_eq!(output.family_code.as_ref(), "HL-TOYOTA-CAMRY-07-13");
        assert_eq!(short_codes(&output), vec!["111000001D"]);
        assert_eq!(
            output.variants.first().map(|codes| codes.feature_code.as_ref()),
            Some("HL-TOYOTA-CAMRY-07-13-D")
        );
        Ok(())
    }

    #[tokio::test]
    async fn existing_family_reuses_its_persisted_serial() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = InMemoryProductStore::with_records(
            vec![ProductFamily {
                family_code: HEADLIGHT_FAMILY_CODE.into(),
                category_id: HEADLIGHTS,
                coding_metadata: headlight_metadata(),
            }],
            vec![ProductVariant {
                short_code: "111123403D".into(),
                feature_code: "HL-TOY-CAMRY-07-13-D".into(),
                family_code: HEADLIGHT_FAMILY_CODE.into(),
                attribute_values: attributes(&[("position", "Left")]),
            }],
        );

        let output = preview_variant_codes(
            &ctx,
            &deps(store),
            PreviewVariantCodesInput {
                category_id: HEADLIGHTS,
                metadata: headlight_metadata(),
                variants: vec![
                    attributes(&[("position", "Right")]),
                    attributes(&[("position", "Pair")]),
                ],
            },
        )
        .await?;

        assert!(output.family_exists);
        assert_eq!(short_codes(&output), vec!["111123403P", "111123403"]);
        Ok(())
    }

    #[tokio::test]
    async fn other_families_push_new_serials_above_the_prefix_maximum() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = InMemoryProductStore::with_records(
            Vec::new(),
            vec![ProductVariant {
                short_code: "111123407D".into(),
                feature_code: "HL-TOY-COROLLA-09-12-D".into(),
                family_code: "HL-TOY-COROLLA-09-12".into(),
                attribute_values: attributes(&[("position", "Left")]),
            }],
        );

        let output = preview_variant_codes(
            &ctx,
            &deps(store),
            PreviewVariantCodesInput {
                category_id: HEADLIGHTS,
                metadata: headlight_metadata(),
                variants: vec![attributes(&[("position", "Left")])],
            },
        )
        .await?;

        assert!(!output.family_exists);
        assert_eq!(short_codes(&output), vec!["111123408D"]);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_attributes_are_kept_but_not_coded() -> Result<()> {
        let ctx = RequestContext::new_request();
        let output = preview_variant_codes(
            &ctx,
            &deps(InMemoryProductStore::new()),
            PreviewVariantCodesInput {
                category_id: HEADLIGHTS,
                metadata: headlight_metadata(),
                variants: vec![attributes(&[("position", "Left"), ("finish", "Matte")])],
            },
        )
        .await?;

        let codes = output.variants.first();
        assert_eq!(codes.map(|codes| codes.short_code.as_ref()), Some("111123401D"));
        assert_eq!(
            codes.map(|codes| codes.feature_code.as_ref()),
            Some("HL-TOY-CAMRY-07-13-D")
        );
        assert_eq!(
            codes.and_then(|codes| codes.attribute_values.get("finish")).map(String::as_str),
            Some("Matte")
        );
        Ok(())
    }
}
