//! JSON-file catalog snapshot and the local adapters built on it.
//!
//! A snapshot holds the read-only catalog (categories, attribute definitions,
//! overrides, vehicle nodes) next to the persisted families and variants.
//! [`LocalCatalog`] serves the catalog half; [`LocalProductStore`] serves the
//! product half and can write committed changes back to the file.

use serde::{Deserialize, Serialize};
use skucode_domain::{CategoryArena, ProductRegistry};
use skucode_ports::{
    AttributeDefinition, BoxFuture, CatalogPort, Category, CategoryAttributeOverride, CategoryId,
    CommitOutcome, FamilyCommit, ProductFamily, ProductStorePort, ProductVariant, ShortCodePrefix,
    VehicleNode, VehicleNodeId,
};
use skucode_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Snapshot format version written by this crate.
pub const CATALOG_SNAPSHOT_VERSION: u32 = 1;

const fn default_snapshot_version() -> u32 {
    CATALOG_SNAPSHOT_VERSION
}

/// On-disk catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    /// Format version.
    #[serde(default = "default_snapshot_version")]
    pub version: u32,
    /// Category tree.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Global attribute definitions.
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
    /// Category-specific attribute overrides.
    #[serde(default)]
    pub overrides: Vec<CategoryAttributeOverride>,
    /// Vehicle hierarchy nodes.
    #[serde(default)]
    pub vehicles: Vec<VehicleNode>,
    /// Persisted families.
    #[serde(default)]
    pub families: Vec<ProductFamily>,
    /// Persisted variants.
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self {
            version: CATALOG_SNAPSHOT_VERSION,
            categories: Vec::new(),
            attributes: Vec::new(),
            overrides: Vec::new(),
            vehicles: Vec::new(),
            families: Vec::new(),
            variants: Vec::new(),
        }
    }
}

/// Read and version-check a snapshot file.
pub async fn read_catalog_snapshot(path: &Path) -> Result<CatalogSnapshot> {
    let payload = match tokio::fs::read(path).await {
        Ok(payload) => payload,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(ErrorEnvelope::expected(
                ErrorCode::new("catalog", "snapshot_not_found"),
                "catalog snapshot file not found",
            )
            .with_metadata("path", path.display().to_string()));
        },
        Err(error) => return Err(ErrorEnvelope::from(error)),
    };

    let snapshot: CatalogSnapshot = serde_json::from_slice(&payload).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("catalog", "snapshot_parse_failed"),
            format!("failed to parse catalog snapshot: {error}"),
        )
        .with_metadata("path", path.display().to_string())
    })?;
    if snapshot.version != CATALOG_SNAPSHOT_VERSION {
        return Err(ErrorEnvelope::expected(
            ErrorCode::new("catalog", "unsupported_snapshot_version"),
            format!(
                "unsupported catalog snapshot version {}, expected {CATALOG_SNAPSHOT_VERSION}",
                snapshot.version
            ),
        )
        .with_metadata("path", path.display().to_string()));
    }

    tracing::debug!(
        path = %path.display(),
        categories = snapshot.categories.len(),
        families = snapshot.families.len(),
        variants = snapshot.variants.len(),
        "catalog snapshot loaded"
    );
    Ok(snapshot)
}

/// Write `snapshot` as pretty JSON, creating parent directories.
pub async fn write_catalog_snapshot(path: &Path, snapshot: &CatalogSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(ErrorEnvelope::from)?;
    }
    let mut payload = serde_json::to_vec_pretty(snapshot).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("catalog", "snapshot_serialize_failed"),
            format!("failed to serialize catalog snapshot: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    payload.push(b'\n');
    tokio::fs::write(path, payload)
        .await
        .map_err(ErrorEnvelope::from)
}

/// Read-only catalog served from a snapshot.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    arena: Arc<CategoryArena>,
    definitions: Arc<BTreeMap<Box<str>, AttributeDefinition>>,
    overrides: Arc<Vec<CategoryAttributeOverride>>,
    vehicles: Arc<HashMap<VehicleNodeId, VehicleNode>>,
}

impl LocalCatalog {
    /// Index the catalog half of `snapshot`.
    #[must_use]
    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Self {
        Self {
            arena: Arc::new(CategoryArena::from_categories(
                snapshot.categories.iter().cloned(),
            )),
            definitions: Arc::new(
                snapshot
                    .attributes
                    .iter()
                    .map(|definition| (definition.key.clone(), definition.clone()))
                    .collect(),
            ),
            overrides: Arc::new(snapshot.overrides.clone()),
            vehicles: Arc::new(
                snapshot
                    .vehicles
                    .iter()
                    .map(|node| (node.id, node.clone()))
                    .collect(),
            ),
        }
    }
}

impl CatalogPort for LocalCatalog {
    fn category_lineage(
        &self,
        ctx: &RequestContext,
        category_id: CategoryId,
        max_depth: u32,
    ) -> BoxFuture<'_, Result<Vec<Category>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("local_catalog.category_lineage")?;
            Ok(self
                .arena
                .lineage(category_id, max_depth)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    fn vehicle_node(
        &self,
        ctx: &RequestContext,
        node_id: VehicleNodeId,
    ) -> BoxFuture<'_, Result<Option<VehicleNode>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("local_catalog.vehicle_node")?;
            Ok(self.vehicles.get(&node_id).cloned())
        })
    }

    fn attribute_definitions(
        &self,
        ctx: &RequestContext,
        keys: Vec<Box<str>>,
    ) -> BoxFuture<'_, Result<Vec<AttributeDefinition>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("local_catalog.attribute_definitions")?;
            Ok(keys
                .iter()
                .filter_map(|key| self.definitions.get(key).cloned())
                .collect())
        })
    }

    fn category_overrides(
        &self,
        ctx: &RequestContext,
        category_id: CategoryId,
        keys: Vec<Box<str>>,
    ) -> BoxFuture<'_, Result<Vec<CategoryAttributeOverride>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("local_catalog.category_overrides")?;
            Ok(self
                .overrides
                .iter()
                .filter(|entry| {
                    entry.category_id == category_id && keys.contains(&entry.attribute_key)
                })
                .cloned()
                .collect())
        })
    }
}

#[derive(Debug)]
struct Persistence {
    path: PathBuf,
    catalog: CatalogSnapshot,
}

/// Product store seeded from a snapshot.
///
/// Without a persistence path, commits live only as long as the store.
#[derive(Debug, Clone)]
pub struct LocalProductStore {
    registry: Arc<RwLock<ProductRegistry>>,
    persistence: Option<Arc<Persistence>>,
}

impl LocalProductStore {
    /// Seed the registry from the product half of `snapshot`.
    #[must_use]
    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Self {
        Self {
            registry: Arc::new(RwLock::new(ProductRegistry::from_records(
                snapshot.families.iter().cloned(),
                snapshot.variants.iter().cloned(),
            ))),
            persistence: None,
        }
    }

    /// Rewrite `path` after every successful commit, keeping the catalog half
    /// of `snapshot`.
    #[must_use]
    pub fn persist_to(mut self, path: PathBuf, snapshot: &CatalogSnapshot) -> Self {
        let catalog = CatalogSnapshot {
            families: Vec::new(),
            variants: Vec::new(),
            ..snapshot.clone()
        };
        self.persistence = Some(Arc::new(Persistence { path, catalog }));
        self
    }

    /// Current registry contents.
    pub async fn registry(&self) -> ProductRegistry {
        self.registry.read().await.clone()
    }
}

impl ProductStorePort for LocalProductStore {
    fn find_family(
        &self,
        ctx: &RequestContext,
        family_code: Box<str>,
    ) -> BoxFuture<'_, Result<Option<ProductFamily>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("local_store.find_family")?;
            Ok(self.registry.read().await.family(&family_code).cloned())
        })
    }

    fn family_variants(
        &self,
        ctx: &RequestContext,
        family_code: Box<str>,
    ) -> BoxFuture<'_, Result<Vec<ProductVariant>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("local_store.family_variants")?;
            let registry = self.registry.read().await;
            Ok(registry.family_variants(&family_code).cloned().collect())
        })
    }

    fn max_serial_for_prefix(
        &self,
        ctx: &RequestContext,
        prefix: ShortCodePrefix,
    ) -> BoxFuture<'_, Result<Option<u32>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("local_store.max_serial_for_prefix")?;
            Ok(self.registry.read().await.max_serial(&prefix))
        })
    }

    fn commit_family(
        &self,
        ctx: &RequestContext,
        commit: FamilyCommit,
    ) -> BoxFuture<'_, Result<CommitOutcome>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("local_store.commit_family")?;
            let mut registry = self.registry.write().await;
            let mut staged = registry.clone();
            let outcome = staged
                .commit(commit.family, commit.variants)
                .map_err(ErrorEnvelope::from)?;

            if let Some(persistence) = &self.persistence {
                let snapshot = CatalogSnapshot {
                    families: staged.families().cloned().collect(),
                    variants: staged.variants().cloned().collect(),
                    ..persistence.catalog.clone()
                };
                write_catalog_snapshot(&persistence.path, &snapshot).await?;
            }
            *registry = staged;
            Ok(outcome)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skucode_testkit::fixtures::{HEADLIGHTS, headlight_catalog_path};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos());
        std::env::temp_dir()
            .join(format!("{prefix}-{nanos}"))
            .join("catalog.json")
    }

    fn family(code: &str) -> ProductFamily {
        ProductFamily {
            family_code: code.into(),
            category_id: HEADLIGHTS,
            coding_metadata: BTreeMap::new(),
        }
    }

    fn variant(short_code: &str, family_code: &str) -> ProductVariant {
        ProductVariant {
            short_code: short_code.into(),
            feature_code: format!("{family_code}-D").into(),
            family_code: family_code.into(),
            attribute_values: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn fixture_snapshot_serves_lineage() -> Result<()> {
        let ctx = RequestContext::new_request();
        let snapshot = read_catalog_snapshot(&headlight_catalog_path()).await?;
        assert_eq!(snapshot.version, CATALOG_SNAPSHOT_VERSION);

        let catalog = LocalCatalog::from_snapshot(&snapshot);
        let lineage = catalog.category_lineage(&ctx, HEADLIGHTS, 32).await?;
        assert_eq!(lineage.len(), 2);

        let overrides = catalog
            .category_overrides(&ctx, HEADLIGHTS, vec!["position".into()])
            .await?;
        assert_eq!(overrides.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_snapshot_is_reported() {
        let error = read_catalog_snapshot(Path::new("/nonexistent/skucode/catalog.json"))
            .await
            .err();
        assert_eq!(
            error.map(|error| error.code),
            Some(ErrorCode::new("catalog", "snapshot_not_found"))
        );
    }

    #[tokio::test]
    async fn persisted_commits_round_trip_through_the_file() -> Result<()> {
        let ctx = RequestContext::new_request();
        let path = temp_path("skucode-store");
        let seed = CatalogSnapshot {
            families: vec![family("HL-A")],
            variants: vec![variant("111000001D", "HL-A")],
            ..CatalogSnapshot::default()
        };
        let store = LocalProductStore::from_snapshot(&seed).persist_to(path.clone(), &seed);

        let outcome = store
            .commit_family(
                &ctx,
                FamilyCommit {
                    family: family("HL-B"),
                    variants: vec![variant("111000002D", "HL-B")],
                },
            )
            .await?;
        assert!(outcome.family_created);

        let reloaded = read_catalog_snapshot(&path).await?;
        assert_eq!(reloaded.families.len(), 2);
        assert_eq!(reloaded.variants.len(), 2);

        let reopened = LocalProductStore::from_snapshot(&reloaded);
        let prefix = ShortCodePrefix::compose("111", None, None);
        assert_eq!(reopened.max_serial_for_prefix(&ctx, prefix).await?, Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn collisions_leave_the_file_untouched() -> Result<()> {
        let ctx = RequestContext::new_request();
        let path = temp_path("skucode-collision");
        let seed = CatalogSnapshot {
            families: vec![family("HL-A")],
            variants: vec![variant("111000001D", "HL-A")],
            ..CatalogSnapshot::default()
        };
        let store = LocalProductStore::from_snapshot(&seed).persist_to(path.clone(), &seed);

        let result = store
            .commit_family(
                &ctx,
                FamilyCommit {
                    family: family("HL-B"),
                    variants: vec![variant("111000001D", "HL-B")],
                },
            )
            .await;
        assert!(result.is_err_and(|error| error.class == ErrorClass::Retriable));
        assert!(!path.exists());
        assert!(store.registry().await.family("HL-B").is_none());
        Ok(())
    }
}
