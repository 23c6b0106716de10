//! Rendering context for family codes.
//!
//! Derived tokens (`cat`, `brand`, `year`) are computed from the category and
//! the reserved metadata keys; every other metadata entry passes through
//! upper-cased and replaces a derived token of the same name. A literal
//! `brand` or `year` is taken as given, even when blank.

use crate::catalog::{CodingMetadata, MetadataValue, VehicleLevel, VehicleNode, VehicleNodeId};
use skucode_core::CodeFormat;
use std::collections::BTreeMap;

/// Placeholder name to rendered value.
pub type RenderContext = BTreeMap<String, String>;

/// `{cat}` when the category has no abbreviation.
pub const UNKNOWN_CATEGORY_TOKEN: &str = "UNK";
/// `{brand}` when neither a brand node nor a literal brand is given.
pub const GENERIC_BRAND_TOKEN: &str = "GEN";
/// `{year}` when no year information is usable.
pub const UNKNOWN_YEAR_TOKEN: &str = "00-00";

const BRAND_REF_KEYS: [&str; 2] = ["brandRef", "brand_id"];
const YEAR_START_KEYS: [&str; 2] = ["yearStart", "year_start"];
const YEAR_END_KEYS: [&str; 2] = ["yearEnd", "year_end"];
const MAKE_CODE_KEYS: [&str; 2] = ["makeCode", "make_code"];
const MODEL_CODE_KEYS: [&str; 2] = ["modelCode", "model_code"];

/// Metadata keys consumed by the derived tokens.
pub const RESERVED_KEYS: [&str; 8] = [
    "brand",
    "brandRef",
    "brand_id",
    "yearStart",
    "year_start",
    "yearEnd",
    "year_end",
    "year",
];

fn lookup<'a>(metadata: &'a CodingMetadata, keys: &[&str]) -> Option<&'a MetadataValue> {
    keys.iter()
        .filter_map(|key| metadata.get(*key))
        .find(|value| !matches!(value, MetadataValue::Null))
}

/// Brand reference carried by the metadata, if any.
pub fn brand_reference(metadata: &CodingMetadata) -> Option<VehicleNodeId> {
    match lookup(metadata, &BRAND_REF_KEYS)? {
        MetadataValue::Int(raw) => u64::try_from(*raw).ok().map(VehicleNodeId::new),
        MetadataValue::Text(raw) => raw.trim().parse().ok().map(VehicleNodeId::new),
        MetadataValue::Null => None,
    }
}

/// Make and model codes supplied for the short-code prefix.
pub fn vehicle_codes(metadata: &CodingMetadata) -> (Option<String>, Option<String>) {
    (
        lookup(metadata, &MAKE_CODE_KEYS).and_then(MetadataValue::as_text),
        lookup(metadata, &MODEL_CODE_KEYS).and_then(MetadataValue::as_text),
    )
}

fn upper_trimmed(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn category_token(abbreviation: Option<&str>) -> String {
    abbreviation
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| UNKNOWN_CATEGORY_TOKEN.to_owned(), str::to_uppercase)
}

fn brand_token(metadata: &CodingMetadata, brand_node: Option<&VehicleNode>) -> String {
    let referenced = brand_reference(metadata).and(brand_node).and_then(|node| {
        if node.level == VehicleLevel::Brand {
            node.abbreviation.as_deref().filter(|value| !value.is_empty())
        } else {
            None
        }
    });
    if let Some(abbreviation) = referenced {
        return abbreviation.to_owned();
    }

    metadata
        .get("brand")
        .and_then(MetadataValue::as_text)
        .map_or_else(|| GENERIC_BRAND_TOKEN.to_owned(), |raw| upper_trimmed(&raw))
}

fn year_digits(value: &MetadataValue) -> Option<String> {
    let year: u32 = match value {
        MetadataValue::Int(raw) => u32::try_from(*raw).ok()?,
        MetadataValue::Text(raw) => raw.trim().parse().ok()?,
        MetadataValue::Null => return None,
    };
    let digits = year.to_string();
    let tail = digits.get(digits.len().saturating_sub(2)..).unwrap_or(&digits);
    Some(tail.to_owned())
}

fn year_token(metadata: &CodingMetadata) -> String {
    if let (Some(start), Some(end)) = (
        lookup(metadata, &YEAR_START_KEYS),
        lookup(metadata, &YEAR_END_KEYS),
    ) {
        return match (year_digits(start), year_digits(end)) {
            (Some(start), Some(end)) => format!("{start}-{end}"),
            _ => UNKNOWN_YEAR_TOKEN.to_owned(),
        };
    }

    metadata
        .get("year")
        .and_then(MetadataValue::as_text)
        .map_or_else(|| UNKNOWN_YEAR_TOKEN.to_owned(), |raw| upper_trimmed(&raw))
}

/// Build the rendering context for a family code.
///
/// `brand_node` is the vehicle node referenced by the metadata brand reference,
/// when the caller could resolve one. Unresolvable references fall back to
/// the literal `brand` entry.
pub fn build_render_context(
    abbreviation: Option<&str>,
    metadata: &CodingMetadata,
    brand_node: Option<&VehicleNode>,
) -> RenderContext {
    let mut context = RenderContext::new();
    context.insert("cat".to_owned(), category_token(abbreviation));
    context.insert("brand".to_owned(), brand_token(metadata, brand_node));
    context.insert("year".to_owned(), year_token(metadata));

    for (key, value) in metadata {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let rendered = value.as_text().map_or_else(
            || CodeFormat::EMPTY_SENTINEL.to_owned(),
            |raw| upper_trimmed(&raw),
        );
        context.insert(key.clone(), rendered);
    }

    context
}
