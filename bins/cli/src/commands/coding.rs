//! Wiring shared by the coding commands: snapshot, settings and observers.

use crate::commands::config::load_effective_config;
use crate::format::OutputMode;
use crate::{ENV_PREFIX, collect_scoped_env};
use serde::de::DeserializeOwned;
use skucode_adapters::{
    CatalogSnapshot, JsonLogger, JsonTelemetry, LocalCatalog, LogSink, StderrLogSink,
    parse_log_level, read_catalog_snapshot,
};
use skucode_app::CodingSettings;
use skucode_config::ValidatedCodingEngineConfig;
use skucode_domain::{CategoryId, CodingMetadata, VariantAttributes};
use skucode_ports::{LogLevel, LoggerPort, TelemetryPort};
use skucode_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Env var selecting the minimum structured log level.
const ENV_LOG_LEVEL: &str = "SKC_LOG_LEVEL";

/// Raw flags of a coding command.
#[derive(Debug, Clone, Copy)]
pub struct CodingCommandInput<'a> {
    /// Catalog snapshot path.
    pub catalog: &'a Path,
    /// Category identifier.
    pub category: u64,
    /// Metadata JSON object.
    pub metadata: &'a str,
    /// Variants JSON array, for commands that code variants.
    pub variants: Option<&'a str>,
    /// Optional config path.
    pub config: Option<&'a Path>,
}

impl CodingCommandInput<'_> {
    pub const fn category_id(&self) -> CategoryId {
        CategoryId::new(self.category)
    }

    pub fn metadata(&self) -> Result<CodingMetadata> {
        parse_json_argument("metadata", self.metadata)
    }

    pub fn variants(&self) -> Result<Vec<VariantAttributes>> {
        self.variants
            .map_or_else(|| Ok(Vec::new()), |raw| parse_json_argument("variants", raw))
    }
}

/// Everything a coding use case needs from the command line.
pub struct CodingSession {
    pub ctx: RequestContext,
    pub snapshot: CatalogSnapshot,
    pub catalog: Arc<LocalCatalog>,
    pub settings: CodingSettings,
    pub logger: Option<Arc<dyn LoggerPort>>,
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

impl CodingSession {
    /// Load config and the catalog snapshot; observers are off under `--no-progress`.
    pub async fn open(
        mode: OutputMode,
        ctx: &RequestContext,
        catalog_path: &Path,
        config_path: Option<&Path>,
    ) -> Result<Self> {
        let env = collect_scoped_env(ENV_PREFIX);
        let config = load_effective_config(&env, config_path, None)?;
        let snapshot = read_catalog_snapshot(catalog_path).await?;
        let (logger, telemetry) = observers(mode, ctx, env.get(ENV_LOG_LEVEL).map(String::as_str));

        Ok(Self {
            catalog: Arc::new(LocalCatalog::from_snapshot(&snapshot)),
            settings: settings_from(&config),
            ctx: ctx.clone(),
            snapshot,
            logger,
            telemetry,
        })
    }
}

/// Engine settings carried by a validated config.
pub fn settings_from(config: &ValidatedCodingEngineConfig) -> CodingSettings {
    CodingSettings {
        max_parent_depth: config.max_parent_depth(),
        default_category_code: config.coding.default_category_code.clone(),
        extractor: config.extractor(),
        retry: config.retry_policy(),
    }
}

/// Logger and telemetry for one request, honoring `SKC_LOG_LEVEL`.
pub fn request_observers(
    mode: OutputMode,
    ctx: &RequestContext,
) -> (Option<Arc<dyn LoggerPort>>, Option<Arc<dyn TelemetryPort>>) {
    let level = std::env::var(ENV_LOG_LEVEL).ok();
    observers(mode, ctx, level.as_deref())
}

fn observers(
    mode: OutputMode,
    ctx: &RequestContext,
    level: Option<&str>,
) -> (Option<Arc<dyn LoggerPort>>, Option<Arc<dyn TelemetryPort>>) {
    if mode.no_progress {
        return (None, None);
    }
    let sink: Arc<dyn LogSink> = Arc::new(StderrLogSink);
    let min_level = level.and_then(parse_log_level).unwrap_or(LogLevel::Info);
    let logger = JsonLogger::new(Arc::clone(&sink))
        .with_min_level(min_level)
        .for_request(ctx);
    let telemetry = JsonTelemetry::new(sink).for_request(ctx);
    (Some(Arc::new(logger)), Some(Arc::new(telemetry)))
}

fn parse_json_argument<T: DeserializeOwned>(argument: &'static str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("--{argument} is not valid JSON for this field: {error}"),
        )
        .with_metadata("argument", argument)
    })
}

/// Drive `future` to completion on a current-thread runtime.
///
/// Ctrl-C cancels `ctx` and the future is still awaited, so the use case
/// reports its own cancellation.
pub fn block_on<F, T>(ctx: &RequestContext, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ErrorEnvelope::from)?;
    runtime.block_on(async {
        tokio::pin!(future);
        tokio::select! {
            result = &mut future => result,
            Ok(()) = tokio::signal::ctrl_c() => {
                tracing::warn!(correlation_id = %ctx.correlation_id(), "interrupted, cancelling");
                ctx.cancel();
                future.await
            },
        }
    })
}
