//! Catalog records consumed by the coding engine.
//!
//! These mirror the persisted shape of categories, attribute definitions and
//! products. The engine never mutates catalog configuration; families and
//! variants are produced by it and handed to the persistence boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a category node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(u64);

impl CategoryId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a node in the vehicle/application hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleNodeId(u64);

impl VehicleNodeId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VehicleNodeId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Business classification of a category; selects the default template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BusinessType {
    /// Generic merchandise: `{cat}-{brand}-{series}`.
    General,
    /// Parts fitted to a vehicle application: `{cat}-{brand}-{model}-{year}`.
    #[default]
    #[serde(alias = "vehicle")]
    VehicleFitment,
    /// Any other classification; treated like vehicle fitment.
    #[serde(other)]
    Other,
}

impl BusinessType {
    /// Template used when no category in the lineage configures one.
    #[must_use]
    pub const fn default_template(self) -> &'static str {
        match self {
            Self::General => "{cat}-{brand}-{series}",
            Self::VehicleFitment | Self::Other => "{cat}-{brand}-{model}-{year}",
        }
    }
}

/// Per-category coding template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodingTemplate {
    /// Template string with `{placeholder}` tokens.
    pub template: Box<str>,
    /// Declared field list, informational only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Box<str>>,
}

impl CodingTemplate {
    /// Returns the template when it is non-blank.
    #[must_use]
    pub fn effective(&self) -> Option<&str> {
        let trimmed = self.template.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Category node of the catalog tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category identifier.
    pub id: CategoryId,
    /// Parent category, if any.
    #[serde(default, alias = "parentRef", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CategoryId>,
    /// Token used for `{cat}` in family codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<Box<str>>,
    /// Numeric segment of the short-code prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_code: Option<Box<str>>,
    /// Business classification.
    #[serde(default)]
    pub business_type: BusinessType,
    /// Template configured on this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coding_template: Option<CodingTemplate>,
}

/// Entry of an attribute option table.
///
/// Tables store either structured entries or bare labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeOption {
    /// Bare label without an explicit code.
    Plain(Box<str>),
    /// Structured entry.
    Entry {
        /// Display label.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<Box<str>>,
        /// Raw stored value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Box<str>>,
        /// Code emitted for this option.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<Box<str>>,
    },
}

/// Default suffix ordering weight.
pub const DEFAULT_CODE_WEIGHT: i32 = 99;

const fn default_code_weight() -> i32 {
    DEFAULT_CODE_WEIGHT
}

/// Global attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    /// Unique attribute key.
    pub key: Box<str>,
    /// Display label.
    #[serde(default)]
    pub label: Box<str>,
    /// Ordered option table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_table: Vec<AttributeOption>,
    /// Sort key for suffix ordering (ascending).
    #[serde(default = "default_code_weight")]
    pub code_weight: i32,
    /// Whether the attribute enters the short code; unset means "infer from key".
    #[serde(
        default,
        alias = "includeInShortCode",
        skip_serializing_if = "Option::is_none"
    )]
    pub include_in_short_code_default: Option<bool>,
}

/// Scope of an attribute within a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeScope {
    /// Shared by every variant of a family.
    #[default]
    Family,
    /// May differ between sibling variants.
    Variant,
}

/// Category-specific override of an attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAttributeOverride {
    /// Category the override applies to.
    pub category_id: CategoryId,
    /// Attribute key the override applies to.
    pub attribute_key: Box<str>,
    /// Attribute scope in this category.
    #[serde(default)]
    pub scope: AttributeScope,
    /// Short-code inclusion override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_in_short_code: Option<bool>,
    /// Replacement option table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_table_override: Option<Vec<AttributeOption>>,
}

/// Level of a vehicle/application hierarchy node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleLevel {
    /// Manufacturer brand.
    Brand,
    /// Make.
    Make,
    /// Model.
    Model,
    /// Model year.
    Year,
}

/// Node of the vehicle/application hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleNode {
    /// Node identifier.
    pub id: VehicleNodeId,
    /// Short token for the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<Box<str>>,
    /// Hierarchy level.
    pub level: VehicleLevel,
}

/// Metadata value supplied for family coding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Explicit null.
    Null,
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(Box<str>),
}

impl MetadataValue {
    /// Returns the value rendered as text, or `None` for null.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Int(value) => Some(value.to_string()),
            Self::Text(value) => Some(value.to_string()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Family-level metadata keyed by field name.
pub type CodingMetadata = BTreeMap<String, MetadataValue>;

/// Human-readable attribute values of one variant.
pub type VariantAttributes = BTreeMap<String, String>;

/// Product family (SPU): one per distinct rendered family code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFamily {
    /// Rendered family code; globally unique.
    pub family_code: Box<str>,
    /// Category the family was coded under.
    pub category_id: CategoryId,
    /// Metadata used to render the family code.
    #[serde(default)]
    pub coding_metadata: CodingMetadata,
}

/// Sellable variant (SKU) of a family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    /// Scanned identifier; globally unique.
    pub short_code: Box<str>,
    /// Human-readable identifier.
    pub feature_code: Box<str>,
    /// Owning family code.
    pub family_code: Box<str>,
    /// Human-readable attribute values.
    #[serde(default)]
    pub attribute_values: VariantAttributes,
}

impl ProductVariant {
    /// Merge mutable fields from a regenerated variant; the short code never changes.
    pub fn merge_from(&mut self, incoming: &Self) {
        self.feature_code.clone_from(&incoming.feature_code);
        self.attribute_values.clone_from(&incoming.attribute_values);
    }
}
