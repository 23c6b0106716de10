//! # skucode-adapters
//!
//! Adapter implementations for ports: the JSON-file catalog snapshot, the
//! JSON-lines logger and telemetry.
//! This crate depends on `domain`, `ports` and `shared`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod catalog_snapshot;
pub mod log_sink;
pub mod logger;
pub mod telemetry;

pub use catalog_snapshot::{
    CATALOG_SNAPSHOT_VERSION, CatalogSnapshot, LocalCatalog, LocalProductStore,
    read_catalog_snapshot, write_catalog_snapshot,
};
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::{JsonLogger, parse_log_level};
pub use telemetry::JsonTelemetry;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
