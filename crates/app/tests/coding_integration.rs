//! End-to-end use-case runs over the snapshot adapters and validated config.

use proptest::prelude::*;
use skucode_adapters::{LocalCatalog, LocalProductStore, read_catalog_snapshot};
use skucode_app::{
    CodingSettings, CommitProductFamilyDeps, CommitProductFamilyInput, PreviewVariantCodesDeps,
    PreviewVariantCodesInput, commit_product_family, preview_variant_codes,
};
use skucode_config::{CodingEnv, ValidatedCodingEngineConfig, load_coding_config_from_path};
use skucode_domain::VariantAttributes;
use skucode_shared::RequestContext;
use skucode_testkit::fixtures::{
    FOG_LIGHTS, HEADLIGHT_FAMILY_CODE, HEADLIGHTS, attributes, headlight_catalog,
    headlight_catalog_path, headlight_metadata, headlight_variants,
};
use skucode_testkit::in_memory::{InMemoryCatalog, InMemoryProductStore};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_snapshot_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    std::env::temp_dir()
        .join(format!("{prefix}-{nanos}"))
        .join("catalog.json")
}

fn config_fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("testkit")
        .join("fixtures")
        .join("config")
        .join(name)
}

fn settings_from(config: &ValidatedCodingEngineConfig) -> CodingSettings {
    CodingSettings {
        max_parent_depth: config.max_parent_depth(),
        default_category_code: config.coding.default_category_code.clone(),
        extractor: config.extractor(),
        retry: config.retry_policy(),
    }
}

#[tokio::test]
async fn committed_codes_survive_a_snapshot_reload() -> Result<(), Box<dyn Error>> {
    let ctx = RequestContext::new_request();
    let path = temp_snapshot_path("skucode-app-commit");
    let snapshot = read_catalog_snapshot(&headlight_catalog_path()).await?;
    let catalog = Arc::new(LocalCatalog::from_snapshot(&snapshot));
    let store = LocalProductStore::from_snapshot(&snapshot).persist_to(path.clone(), &snapshot);

    let committed = commit_product_family(
        &ctx,
        &CommitProductFamilyDeps {
            catalog: catalog.clone(),
            store: Arc::new(store),
            settings: CodingSettings::default(),
            logger: None,
            telemetry: None,
        },
        CommitProductFamilyInput {
            category_id: HEADLIGHTS,
            metadata: headlight_metadata(),
            variants: headlight_variants(),
        },
    )
    .await?;
    assert!(committed.family_created);
    assert_eq!(committed.created, 3);

    let reloaded = read_catalog_snapshot(&path).await?;
    assert_eq!(reloaded.families.len(), 1);
    assert_eq!(reloaded.variants.len(), 3);
    assert_eq!(reloaded.categories.len(), snapshot.categories.len());

    let preview = preview_variant_codes(
        &ctx,
        &PreviewVariantCodesDeps {
            catalog,
            store: Arc::new(LocalProductStore::from_snapshot(&reloaded)),
            settings: CodingSettings::default(),
            logger: None,
            telemetry: None,
        },
        PreviewVariantCodesInput {
            category_id: HEADLIGHTS,
            metadata: headlight_metadata(),
            variants: headlight_variants(),
        },
    )
    .await?;

    assert!(preview.family_exists);
    assert_eq!(preview.family_code.as_ref(), HEADLIGHT_FAMILY_CODE);
    assert_eq!(preview.variants, committed.variants);

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
    Ok(())
}

#[tokio::test]
async fn configured_rules_and_default_category_code_apply() -> Result<(), Box<dyn Error>> {
    let ctx = RequestContext::new_request();
    let env = CodingEnv::from_map(&BTreeMap::new())?;
    let config_path = config_fixture("coding-config.valid.json");
    let config = load_coding_config_from_path(Some(config_path.as_path()), None, &env)?;
    let snapshot = read_catalog_snapshot(&headlight_catalog_path()).await?;

    let preview = preview_variant_codes(
        &ctx,
        &PreviewVariantCodesDeps {
            catalog: Arc::new(LocalCatalog::from_snapshot(&snapshot)),
            store: Arc::new(LocalProductStore::from_snapshot(&snapshot)),
            settings: settings_from(&config),
            logger: None,
            telemetry: None,
        },
        PreviewVariantCodesInput {
            category_id: FOG_LIGHTS,
            metadata: headlight_metadata(),
            variants: vec![attributes(&[("position", "Driver side"), ("color", "Red")])],
        },
    )
    .await?;

    assert_eq!(preview.prefix.as_str(), "9001234");
    let codes = preview.variants.first().ok_or("no variant coded")?;
    assert_eq!(codes.short_code.as_ref(), "900123401D");
    assert_eq!(codes.feature_code.as_ref(), "FL-TOY-CAMRY-07-13-D-RED");
    Ok(())
}

fn preview_serials(
    variants: Vec<VariantAttributes>,
) -> Result<BTreeMap<String, u32>, Box<dyn Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let output = runtime.block_on(preview_variant_codes(
        &RequestContext::new_request(),
        &PreviewVariantCodesDeps {
            catalog: Arc::new(InMemoryCatalog::from_fixture(&headlight_catalog())),
            store: Arc::new(InMemoryProductStore::new()),
            settings: CodingSettings::default(),
            logger: None,
            telemetry: None,
        },
        PreviewVariantCodesInput {
            category_id: HEADLIGHTS,
            metadata: headlight_metadata(),
            variants,
        },
    ))?;
    Ok(output
        .variants
        .into_iter()
        .map(|codes| (codes.signature.to_string(), codes.serial))
        .collect())
}

proptest! {
    #[test]
    fn serials_do_not_depend_on_input_order(
        shuffled in Just(headlight_variants()).prop_shuffle(),
    ) {
        let baseline = preview_serials(headlight_variants())
            .map_err(|error| TestCaseError::fail(error.to_string()))?;
        let reordered = preview_serials(shuffled)
            .map_err(|error| TestCaseError::fail(error.to_string()))?;
        prop_assert_eq!(baseline, reordered);
    }
}
