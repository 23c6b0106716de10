//! # skucode-ports
//!
//! Port traits for the skucode hexagonal architecture.
//!
//! This crate defines the interfaces between the coding use cases and the
//! catalog/product stores. It depends only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod catalog;
pub mod logger;
pub mod store;
pub mod telemetry;

pub use catalog::*;
pub use logger::*;
pub use store::*;
pub use telemetry::*;

// Domain types that appear in port signatures, re-exported for adapters.
pub use skucode_domain::{
    AttributeDefinition, Category, CategoryAttributeOverride, CategoryId, ProductFamily,
    ProductVariant, ShortCodePrefix, VehicleNode, VehicleNodeId,
};

#[cfg(test)]
mod tests {
    use super::*;
    use skucode_domain::domain_crate_version;
    use skucode_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("skucode-") {
                let name = line.split(['=', '.']).next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn ports_depends_only_on_domain_and_shared() {
        let deps = workspace_deps();
        let allowed = ["skucode-domain", "skucode-shared"];

        for dep in &deps {
            assert!(
                allowed.contains(&dep.as_str()),
                "unexpected dependency found: {dep}"
            );
        }
        for expected in allowed {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }

    #[test]
    fn ports_can_use_domain_and_shared() {
        assert!(!ports_crate_version().is_empty());
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }

    #[test]
    fn log_levels_are_ordered_by_severity() {
        assert!(LogLevel::Debug < LogLevel::Error);
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }
}
