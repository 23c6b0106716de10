//! # skucode-config
//!
//! Configuration schema, validation, and normalization for the coding engine.
//! This crate depends on `core`, `domain` and `shared` only.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    CURRENT_CONFIG_VERSION, CodingConfig, CodingEngineConfig, ConfigSchemaError,
    DEFAULT_CATEGORY_CODE, RetryConfig, ValidatedCodingEngineConfig, parse_coding_config_json,
    parse_coding_config_toml,
};

pub use env::{CodingEnv, EnvParseError, apply_env_overrides};
pub use load::{
    load_coding_config_from_path, load_coding_config_from_sources, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use skucode_domain::domain_crate_version;
    use skucode_shared::shared_crate_version;

    #[test]
    fn config_crate_compiles() {
        let version = config_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn config_can_use_domain_and_shared() {
        let domain_version = domain_crate_version();
        let shared_version = shared_crate_version();

        assert!(!domain_version.is_empty());
        assert!(!shared_version.is_empty());
    }
}
