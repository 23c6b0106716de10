//! # skucode-app
//!
//! Coding use cases: family-code generation, variant previews, commits and
//! serial previews.
//! This crate depends on `ports`, `domain`, `shared` and `core`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commit_product_family;
pub mod generate_family_code;
pub mod next_serial_preview;
pub mod preview_variant_codes;
pub mod settings;

mod observe;
mod pipeline;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use commit_product_family::{
    CommitProductFamilyDeps, CommitProductFamilyInput, CommitProductFamilyOutput,
    commit_product_family,
};
pub use generate_family_code::{
    GenerateFamilyCodeDeps, GenerateFamilyCodeInput, GenerateFamilyCodeOutput,
    generate_family_code,
};
pub use next_serial_preview::{
    NextSerialPreviewDeps, NextSerialPreviewInput, NextSerialPreviewOutput, next_serial_preview,
};
pub use preview_variant_codes::{
    PreviewVariantCodesDeps, PreviewVariantCodesInput, PreviewVariantCodesOutput,
    preview_variant_codes,
};
pub use settings::CodingSettings;

#[cfg(test)]
mod tests {
    use super::*;
    use skucode_domain::domain_crate_version;
    use skucode_ports::ports_crate_version;
    use skucode_shared::shared_crate_version;

    #[test]
    fn app_crate_compiles() {
        let version = app_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn app_can_use_ports_domain_shared() {
        let ports_version = ports_crate_version();
        let domain_version = domain_crate_version();
        let shared_version = shared_crate_version();

        assert!(!ports_version.is_empty());
        assert!(!domain_version.is_empty());
        assert!(!shared_version.is_empty());
    }
}
