//! Sample catalog data shared by app, adapter and CLI tests.
//!
//! The headlight catalog has a `Lighting` root that owns the fitment template,
//! a `Headlights` child that inherits it, and a `general` accessories branch.

use serde::Deserialize;
use skucode_domain::{
    AttributeDefinition, Category, CategoryAttributeOverride, CategoryId, CodingMetadata,
    MetadataValue, ProductFamily, ProductVariant, VariantAttributes, VehicleNode,
};
use std::path::PathBuf;

/// Category that owns the fitment template.
pub const LIGHTING: CategoryId = CategoryId::new(1);
/// Headlights; inherits the template, short code `111`.
pub const HEADLIGHTS: CategoryId = CategoryId::new(2);
/// General merchandise; uses the business-type default template.
pub const ACCESSORIES: CategoryId = CategoryId::new(3);
/// Fog lights; no short code of its own.
pub const FOG_LIGHTS: CategoryId = CategoryId::new(4);

/// Family code rendered for [`headlight_metadata`].
pub const HEADLIGHT_FAMILY_CODE: &str = "HL-TOY-CAMRY-07-13";

const HEADLIGHT_CATALOG_JSON: &str = include_str!("../fixtures/catalog/headlights.json");

/// Catalog records as stored in a snapshot file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogFixture {
    /// Category tree.
    pub categories: Vec<Category>,
    /// Attribute definitions.
    pub attributes: Vec<AttributeDefinition>,
    /// Category-specific overrides.
    pub overrides: Vec<CategoryAttributeOverride>,
    /// Vehicle hierarchy nodes.
    pub vehicles: Vec<VehicleNode>,
    /// Persisted families.
    pub families: Vec<ProductFamily>,
    /// Persisted variants.
    pub variants: Vec<ProductVariant>,
}

/// Parse the bundled headlight catalog.
pub fn headlight_catalog() -> CatalogFixture {
    serde_json::from_str(HEADLIGHT_CATALOG_JSON).expect("bundled catalog fixture is valid")
}

/// Path of the bundled headlight catalog file.
pub fn headlight_catalog_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("catalog")
        .join("headlights.json")
}

/// Toyota Camry 2007-2013 fitment metadata, with make/model prefix codes.
pub fn headlight_metadata() -> CodingMetadata {
    CodingMetadata::from([
        ("brandRef".to_owned(), MetadataValue::Int(10)),
        ("model".to_owned(), MetadataValue::from("Camry")),
        ("yearStart".to_owned(), MetadataValue::Int(2007)),
        ("yearEnd".to_owned(), MetadataValue::Int(2013)),
        ("makeCode".to_owned(), MetadataValue::from("12")),
        ("modelCode".to_owned(), MetadataValue::from("34")),
    ])
}

/// Build a variant attribute map from `(key, value)` pairs.
pub fn attributes(entries: &[(&str, &str)]) -> VariantAttributes {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

/// Left/red, left/amber and right/red headlights.
pub fn headlight_variants() -> Vec<VariantAttributes> {
    vec![
        attributes(&[("position", "Left"), ("color", "Red")]),
        attributes(&[("position", "Left"), ("color", "Amber")]),
        attributes(&[("position", "Right"), ("color", "Red")]),
    ]
}
