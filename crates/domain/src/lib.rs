//! # skucode-domain
//!
//! Catalog entities and the pure coding pipeline.
//!
//! - **Catalog** - `Category`, `AttributeDefinition`, `ProductFamily`, `ProductVariant`
//! - **Category** - lineage walk and template inheritance (`CategoryArena`)
//! - **Context / Template** - family-code rendering
//! - **Scope / Extraction** - attribute visibility and value-to-code mapping
//! - **Grouping / Assemble** - invisible signatures, serials, short and feature codes
//! - **Registry** - in-memory families and variants with short-code uniqueness
//!
//! ## Dependency Rules
//!
//! - Depends only on `core` and `shared`
//! - No I/O; catalog data is passed in by the caller

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use skucode_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod assemble;
pub mod catalog;
pub mod category;
pub mod context;
pub mod error;
pub mod extraction;
pub mod grouping;
pub mod registry;
pub mod scope;
pub mod template;

pub use assemble::{SuffixCode, VariantCodes, VariantPlan, feature_code, short_code};
pub use catalog::{
    AttributeDefinition, AttributeOption, AttributeScope, BusinessType, Category,
    CategoryAttributeOverride, CategoryId, CodingMetadata, CodingTemplate, DEFAULT_CODE_WEIGHT,
    MetadataValue, ProductFamily, ProductVariant, VariantAttributes, VehicleLevel, VehicleNode,
    VehicleNodeId,
};
pub use category::{CategoryArena, ResolvedCategory, TemplateSource};
pub use context::{
    GENERIC_BRAND_TOKEN, RenderContext, UNKNOWN_CATEGORY_TOKEN, UNKNOWN_YEAR_TOKEN,
    brand_reference, build_render_context, vehicle_codes,
};
pub use error::CodingError;
pub use extraction::{
    CodeExtractor, ExtractionRule, PAIR_TOKEN, RuleMatcher, default_extraction_rules,
    fallback_token,
};
pub use grouping::{SerialLedger, ShortCodePrefix, Signature, fit_segment, max_serial_in};
pub use registry::{CommitOutcome, ProductRegistry};
pub use scope::{AttributeResolution, AttributeResolutions, infer_short_code_inclusion};
pub use template::{is_blank_value, placeholders, render_template};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================
