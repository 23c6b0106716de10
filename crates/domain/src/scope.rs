//! Attribute scope and short-code visibility per category.

use crate::catalog::{
    AttributeDefinition, AttributeOption, AttributeScope, CategoryAttributeOverride, CategoryId,
};
use std::collections::BTreeMap;

const EXCLUDED_KEY_HINTS: [&str; 2] = ["COLOR", "颜色"];
const INCLUDED_KEY_HINTS: [&str; 2] = ["POSITION", "位置"];

/// Short-code inclusion inferred from the attribute key.
///
/// Color-like keys are excluded, position-like keys included; anything else
/// has no opinion.
pub fn infer_short_code_inclusion(key: &str) -> Option<bool> {
    let upper = key.to_uppercase();
    if EXCLUDED_KEY_HINTS.iter().any(|hint| upper.contains(*hint)) {
        Some(false)
    } else if INCLUDED_KEY_HINTS.iter().any(|hint| upper.contains(*hint)) {
        Some(true)
    } else {
        None
    }
}

/// Effective coding behaviour of one attribute in one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeResolution {
    /// Attribute key.
    pub key: Box<str>,
    /// Suffix ordering weight.
    pub code_weight: i32,
    /// Whether the attribute varies between sibling variants.
    pub variant_scope: bool,
    /// Whether the attribute's code enters the short code.
    pub include_in_short_code: bool,
    /// Option table in effect (category override or global).
    pub option_table: Vec<AttributeOption>,
}

impl AttributeResolution {
    /// Combine a definition with the category's override, if any.
    #[must_use]
    pub fn from_parts(
        definition: &AttributeDefinition,
        category_override: Option<&CategoryAttributeOverride>,
    ) -> Self {
        let mut include = definition
            .include_in_short_code_default
            .or_else(|| infer_short_code_inclusion(&definition.key))
            .unwrap_or(true);
        let mut variant_scope = true;
        let mut option_table = definition.option_table.clone();

        if let Some(overrides) = category_override {
            variant_scope = overrides.scope == AttributeScope::Variant;
            if let Some(value) = overrides.include_in_short_code {
                include = value;
            }
            if let Some(table) = &overrides.option_table_override {
                option_table.clone_from(table);
            }
        }

        Self {
            key: definition.key.clone(),
            code_weight: definition.code_weight,
            variant_scope,
            include_in_short_code: include,
            option_table,
        }
    }

    /// Variant-scope and excluded from the short code.
    #[must_use]
    pub const fn is_invisible(&self) -> bool {
        self.variant_scope && !self.include_in_short_code
    }

    /// Variant-scope and included in the short code.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.variant_scope && self.include_in_short_code
    }
}

/// Batch of resolutions for every attribute referenced by one generation call.
///
/// Keys without a definition are absent; callers treat them as neither
/// variant-scope nor included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeResolutions {
    entries: BTreeMap<Box<str>, AttributeResolution>,
}

impl AttributeResolutions {
    /// Resolve all `definitions` against the overrides of `category_id`.
    ///
    /// Overrides for other categories are ignored.
    #[must_use]
    pub fn resolve(
        category_id: CategoryId,
        definitions: &[AttributeDefinition],
        overrides: &[CategoryAttributeOverride],
    ) -> Self {
        let by_key: BTreeMap<&str, &CategoryAttributeOverride> = overrides
            .iter()
            .filter(|entry| entry.category_id == category_id)
            .map(|entry| (&*entry.attribute_key, entry))
            .collect();

        let entries = definitions
            .iter()
            .map(|definition| {
                let resolution = AttributeResolution::from_parts(
                    definition,
                    by_key.get(&*definition.key).copied(),
                );
                (definition.key.clone(), resolution)
            })
            .collect();
        Self { entries }
    }

    /// Resolution for `key`, if the attribute is defined.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttributeResolution> {
        self.entries.get(key)
    }

    /// Number of resolved attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(key: &str, include: Option<bool>) -> AttributeDefinition {
        AttributeDefinition {
            key: key.into(),
            label: key.into(),
            option_table: Vec::new(),
            code_weight: 10,
            include_in_short_code_default: include,
        }
    }

    fn override_for(key: &str, scope: AttributeScope, include: Option<bool>) -> CategoryAttributeOverride {
        CategoryAttributeOverride {
            category_id: CategoryId::new(1),
            attribute_key: key.into(),
            scope,
            include_in_short_code: include,
            option_table_override: None,
        }
    }

    #[test]
    fn key_heuristics_apply_only_without_explicit_default() {
        let color = AttributeResolution::from_parts(&definition("body_color", None), None);
        assert!(color.is_invisible());

        let position = AttributeResolution::from_parts(&definition("Position", None), None);
        assert!(position.is_visible());

        let material = AttributeResolution::from_parts(&definition("material", None), None);
        assert!(material.is_visible());

        let explicit = AttributeResolution::from_parts(&definition("color", Some(true)), None);
        assert!(explicit.is_visible());

        assert_eq!(infer_short_code_inclusion("颜色"), Some(false));
        assert_eq!(infer_short_code_inclusion("安装位置"), Some(true));
        assert_eq!(infer_short_code_inclusion("color_position"), Some(false));
    }

    #[test]
    fn overrides_take_final_precedence() {
        let def = definition("color", None);
        let forced = override_for("color", AttributeScope::Variant, Some(true));
        let resolution = AttributeResolution::from_parts(&def, Some(&forced));
        assert!(resolution.is_visible());

        let family = override_for("color", AttributeScope::Family, None);
        let resolution = AttributeResolution::from_parts(&def, Some(&family));
        assert!(!resolution.variant_scope);
        assert!(!resolution.is_invisible());
        assert!(!resolution.is_visible());
    }

    #[test]
    fn option_override_replaces_global_table() {
        let mut def = definition("finish", None);
        def.option_table = vec![AttributeOption::Plain("Gloss".into())];
        let mut custom = override_for("finish", AttributeScope::Variant, None);
        custom.option_table_override = Some(vec![AttributeOption::Plain("Satin".into())]);

        let resolution = AttributeResolution::from_parts(&def, Some(&custom));
        assert_eq!(
            resolution.option_table,
            vec![AttributeOption::Plain("Satin".into())]
        );
    }

    #[test]
    fn batch_resolution_filters_by_category() {
        let mut foreign = override_for("position", AttributeScope::Family, None);
        foreign.category_id = CategoryId::new(2);

        let resolutions = AttributeResolutions::resolve(
            CategoryId::new(1),
            &[definition("position", None), definition("color", None)],
            &[foreign],
        );

        assert_eq!(resolutions.len(), 2);
        assert!(resolutions.get("position").is_some_and(AttributeResolution::is_visible));
        assert!(resolutions.get("color").is_some_and(AttributeResolution::is_invisible));
        assert!(resolutions.get("voltage").is_none());
    }
}
