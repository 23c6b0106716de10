//! Port implementations backed by plain collections.
//!
//! The catalog and product store hold a [`CatalogFixture`] in memory, and the
//! recording logger and telemetry keep every event for assertions.

use crate::fixtures::CatalogFixture;
use skucode_domain::{CategoryArena, CodingError, ProductRegistry};
use skucode_ports::{
    AttributeDefinition, BoxFuture, CatalogPort, Category, CategoryAttributeOverride, CategoryId,
    CommitOutcome, FamilyCommit, LogEvent, LogFields, LoggerPort, ProductFamily, ProductStorePort,
    ProductVariant, ShortCodePrefix, TelemetryPort, TelemetryTags, TelemetryTimer, VehicleNode,
    VehicleNodeId,
};
use skucode_shared::{ErrorEnvelope, RequestContext, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// A no-op telemetry timer.
#[derive(Debug, Default)]
pub struct NoopTimer;

impl TelemetryTimer for NoopTimer {
    fn stop(&self) {}
}

/// A no-op telemetry implementation.
#[derive(Debug, Default)]
pub struct NoopTelemetry;

impl TelemetryPort for NoopTelemetry {
    fn increment_counter(&self, _name: &str, _value: u64, _tags: Option<&TelemetryTags>) {}

    fn record_timer_ms(&self, _name: &str, _duration_ms: u64, _tags: Option<&TelemetryTags>) {}

    fn start_timer(&self, _name: &str, _tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(NoopTimer)
    }
}

/// Logger that keeps every event for later assertions.
///
/// Child loggers share the parent's buffer and merge their base fields into
/// each event.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
    base: LogFields,
}

impl RecordingLogger {
    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of all recorded events, oldest first.
    pub fn event_names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| event.event.into_string())
            .collect()
    }

    /// Returns true if an event named `name` was recorded.
    pub fn has_event(&self, name: &str) -> bool {
        self.events().iter().any(|event| event.event.as_ref() == name)
    }
}

impl LoggerPort for RecordingLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base.is_empty() {
            let mut fields = self.base.clone();
            fields.extend(event.fields.take().unwrap_or_default());
            event.fields = Some(fields);
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base = self.base.clone();
        base.extend(fields);
        Box::new(Self {
            events: Arc::clone(&self.events),
            base,
        })
    }
}

#[derive(Debug, Default)]
struct TelemetryState {
    counters: BTreeMap<String, u64>,
    timers: Vec<String>,
}

/// Telemetry that sums counters and records timer names.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    state: Arc<Mutex<TelemetryState>>,
}

impl RecordingTelemetry {
    /// Current value of counter `name` (zero when never incremented).
    pub fn counter(&self, name: &str) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .counters
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    /// Names of recorded timers, in recording order.
    pub fn timers(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .timers
            .clone()
    }
}

struct RecordingTimer {
    name: String,
    state: Arc<Mutex<TelemetryState>>,
}

impl TelemetryTimer for RecordingTimer {
    fn stop(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .timers
            .push(self.name.clone());
    }
}

impl TelemetryPort for RecordingTelemetry {
    fn increment_counter(&self, name: &str, value: u64, _tags: Option<&TelemetryTags>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = state.counters.entry(name.to_owned()).or_default();
        *counter = counter.saturating_add(value);
    }

    fn record_timer_ms(&self, name: &str, _duration_ms: u64, _tags: Option<&TelemetryTags>) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .timers
            .push(name.to_owned());
    }

    fn start_timer(&self, name: &str, _tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(RecordingTimer {
            name: name.to_owned(),
            state: Arc::clone(&self.state),
        })
    }
}

/// Read-only catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    arena: CategoryArena,
    definitions: BTreeMap<Box<str>, AttributeDefinition>,
    overrides: Vec<CategoryAttributeOverride>,
    vehicles: HashMap<VehicleNodeId, VehicleNode>,
}

impl InMemoryCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded from a fixture's catalog records.
    pub fn from_fixture(fixture: &CatalogFixture) -> Self {
        Self::new()
            .with_categories(fixture.categories.clone())
            .with_attributes(fixture.attributes.clone())
            .with_overrides(fixture.overrides.clone())
            .with_vehicles(fixture.vehicles.clone())
    }

    /// Replace the category tree.
    #[must_use]
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.arena = CategoryArena::from_categories(categories);
        self
    }

    /// Add attribute definitions (later keys replace earlier ones).
    #[must_use]
    pub fn with_attributes(mut self, definitions: Vec<AttributeDefinition>) -> Self {
        self.definitions.extend(
            definitions
                .into_iter()
                .map(|definition| (definition.key.clone(), definition)),
        );
        self
    }

    /// Add category overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Vec<CategoryAttributeOverride>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Add vehicle nodes.
    #[must_use]
    pub fn with_vehicles(mut self, vehicles: Vec<VehicleNode>) -> Self {
        self.vehicles
            .extend(vehicles.into_iter().map(|node| (node.id, node)));
        self
    }
}

impl CatalogPort for InMemoryCatalog {
    fn category_lineage(
        &self,
        ctx: &RequestContext,
        category_id: CategoryId,
        max_depth: u32,
    ) -> BoxFuture<'_, Result<Vec<Category>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("in_memory_catalog.category_lineage")?;
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
            ctx.ensure_not_cancelled("in_memory_catalog.vehicle_node")?;
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
            ctx.ensure_not_cancelled("in_memory_catalog.attribute_definitions")?;
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
            ctx.ensure_not_cancelled("in_memory_catalog.category_overrides")?;
            Ok(self
                .overrides
                .iter()
                .filter(|entry| entry.category_id == category_id && keys.contains(&entry.attribute_key))
                .cloned()
                .collect())
        })
    }
}

/// Product store backed by a [`ProductRegistry`].
///
/// Collisions can be injected to exercise the commit retry path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    registry: Arc<RwLock<ProductRegistry>>,
    injected_collisions: Arc<AtomicU32>,
    commit_attempts: Arc<AtomicU32>,
}

impl InMemoryProductStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with persisted families and variants.
    pub fn with_records(families: Vec<ProductFamily>, variants: Vec<ProductVariant>) -> Self {
        Self {
            registry: Arc::new(RwLock::new(ProductRegistry::from_records(
                families, variants,
            ))),
            ..Self::default()
        }
    }

    /// Fail the next `count` commits with a retriable collision.
    pub fn inject_collisions(&self, count: u32) {
        self.injected_collisions.store(count, Ordering::SeqCst);
    }

    /// Number of `commit_family` calls so far.
    pub fn commit_attempts(&self) -> u32 {
        self.commit_attempts.load(Ordering::SeqCst)
    }

    /// Copy of the current registry.
    pub async fn snapshot(&self) -> ProductRegistry {
        self.registry.read().await.clone()
    }

    fn take_injected_collision(&self) -> bool {
        self.injected_collisions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok()
    }
}

impl ProductStorePort for InMemoryProductStore {
    fn find_family(
        &self,
        ctx: &RequestContext,
        family_code: Box<str>,
    ) -> BoxFuture<'_, Result<Option<ProductFamily>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("in_memory_store.find_family")?;
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
            ctx.ensure_not_cancelled("in_memory_store.family_variants")?;
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
            ctx.ensure_not_cancelled("in_memory_store.max_serial_for_prefix")?;
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
            ctx.ensure_not_cancelled("in_memory_store.commit_family")?;
            self.commit_attempts.fetch_add(1, Ordering::SeqCst);

            if self.take_injected_collision() {
                let short_code = commit
                    .variants
                    .first()
                    .map(|variant| variant.short_code.clone())
                    .unwrap_or_default();
                return Err(ErrorEnvelope::from(CodingError::CodeCollision {
                    short_code,
                    family_code: commit.family.family_code.clone(),
                    owner_family_code: "injected".into(),
                }));
            }

            let mut registry = self.registry.write().await;
            registry
                .commit(commit.family, commit.variants)
                .map_err(ErrorEnvelope::from)
        })
    }
}
