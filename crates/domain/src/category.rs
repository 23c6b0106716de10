//! Category lineage and coding-template resolution.

use crate::catalog::{BusinessType, Category, CategoryId, CodingTemplate};
use crate::error::CodingError;
use std::collections::{HashMap, HashSet};

/// Where the effective template came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource {
    /// Configured on the category itself or on an ancestor.
    Category(CategoryId),
    /// Business-type default; no category in reach configured a template.
    BusinessTypeDefault(BusinessType),
}

/// Coding configuration effective for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCategory {
    /// Requested category.
    pub category_id: CategoryId,
    /// Nearest non-empty template.
    pub template: Box<str>,
    /// Where `template` came from.
    pub source: TemplateSource,
    /// The requested category's own abbreviation.
    pub abbreviation: Option<Box<str>>,
    /// The requested category's own short code.
    pub short_code: Option<Box<str>>,
}

/// Index-based arena over category records.
///
/// Parent links are resolved to arena slots once, so walking the lineage is a
/// bounded loop over indices.
#[derive(Debug, Clone, Default)]
pub struct CategoryArena {
    nodes: Vec<Category>,
    parents: Vec<Option<usize>>,
    index: HashMap<CategoryId, usize>,
}

impl CategoryArena {
    /// Build an arena; later duplicates of an id replace earlier ones.
    #[must_use]
    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut nodes: Vec<Category> = Vec::new();
        let mut index = HashMap::new();
        for category in categories {
            match index.get(&category.id) {
                Some(&slot) => {
                    if let Some(existing) = nodes.get_mut(slot) {
                        *existing = category;
                    }
                },
                None => {
                    index.insert(category.id, nodes.len());
                    nodes.push(category);
                },
            }
        }
        let parents = nodes
            .iter()
            .map(|node| node.parent_id.and_then(|parent| index.get(&parent).copied()))
            .collect();

        Self {
            nodes,
            parents,
            index,
        }
    }

    /// Number of categories held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true when the arena holds no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a category by id.
    #[must_use]
    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.index.get(&id).and_then(|&slot| self.nodes.get(slot))
    }

    /// Categories from `id` towards the root, nearest first.
    ///
    /// Stops after `max_depth` records or on the first repeated category.
    #[must_use]
    pub fn lineage(&self, id: CategoryId, max_depth: u32) -> Vec<&Category> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = self.index.get(&id).copied();
        while let Some(slot) = cursor {
            if out.len() >= max_depth as usize || !seen.insert(slot) {
                break;
            }
            let Some(node) = self.nodes.get(slot) else {
                break;
            };
            out.push(node);
            cursor = self.parents.get(slot).copied().flatten();
        }
        out
    }

    /// Resolve the effective coding template for `id`.
    ///
    /// At most `max_depth` nodes (the category included) are inspected, which
    /// also terminates cyclic parent chains. Running out of depth behaves like
    /// reaching the root without a template.
    pub fn resolve(&self, id: CategoryId, max_depth: u32) -> Result<ResolvedCategory, CodingError> {
        let Some(&start) = self.index.get(&id) else {
            return Err(CodingError::CategoryNotFound { category_id: id });
        };
        let Some(category) = self.nodes.get(start) else {
            return Err(CodingError::CategoryNotFound { category_id: id });
        };

        let mut cursor = Some(start);
        let mut remaining = max_depth;
        let mut found = None;
        while let Some(slot) = cursor {
            if remaining == 0 {
                break;
            }
            remaining -= 1;

            let Some(node) = self.nodes.get(slot) else {
                break;
            };
            if let Some(template) = node.coding_template.as_ref().and_then(CodingTemplate::effective) {
                found = Some((template, node.id));
                break;
            }
            cursor = self.parents.get(slot).copied().flatten();
        }

        let (template, source) = found.map_or_else(
            || {
                let business_type = category.business_type;
                (
                    business_type.default_template(),
                    TemplateSource::BusinessTypeDefault(business_type),
                )
            },
            |(template, owner)| (template, TemplateSource::Category(owner)),
        );

        Ok(ResolvedCategory {
            category_id: id,
            template: template.into(),
            source,
            abbreviation: category.abbreviation.clone(),
            short_code: category.short_code.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: u64, parent: Option<u64>, template: Option<&str>) -> Category {
        Category {
            id: CategoryId::new(id),
            parent_id: parent.map(CategoryId::new),
            abbreviation: Some(format!("C{id}").into()),
            short_code: Some(format!("{id:03}").into()),
            business_type: BusinessType::VehicleFitment,
            coding_template: template.map(|template| CodingTemplate {
                template: template.into(),
                fields: Vec::new(),
            }),
        }
    }

    #[test]
    fn child_inherits_nearest_ancestor_template() -> Result<(), CodingError> {
        let arena = CategoryArena::from_categories([
            category(1, None, Some("{cat}-{brand}")),
            category(2, Some(1), Some("{cat}-{brand}-{model}")),
            category(3, Some(2), None),
        ]);

        let resolved = arena.resolve(CategoryId::new(3), 32)?;
        assert_eq!(resolved.template.as_ref(), "{cat}-{brand}-{model}");
        assert_eq!(resolved.source, TemplateSource::Category(CategoryId::new(2)));
        assert_eq!(resolved.abbreviation.as_deref(), Some("C3"));
        assert_eq!(resolved.short_code.as_deref(), Some("003"));
        Ok(())
    }

    #[test]
    fn blank_templates_are_skipped() -> Result<(), CodingError> {
        let arena = CategoryArena::from_categories([
            category(1, None, Some("{cat}-{series}")),
            category(2, Some(1), Some("   ")),
        ]);

        let resolved = arena.resolve(CategoryId::new(2), 32)?;
        assert_eq!(resolved.template.as_ref(), "{cat}-{series}");
        Ok(())
    }

    #[test]
    fn missing_template_uses_business_type_default() -> Result<(), CodingError> {
        let mut general = category(5, None, None);
        general.business_type = BusinessType::General;
        let arena = CategoryArena::from_categories([general, category(6, None, None)]);

        let resolved = arena.resolve(CategoryId::new(5), 32)?;
        assert_eq!(resolved.template.as_ref(), "{cat}-{brand}-{series}");

        let resolved = arena.resolve(CategoryId::new(6), 32)?;
        assert_eq!(resolved.template.as_ref(), "{cat}-{brand}-{model}-{year}");
        assert_eq!(
            resolved.source,
            TemplateSource::BusinessTypeDefault(BusinessType::VehicleFitment)
        );
        Ok(())
    }

    #[test]
    fn cyclic_lineage_terminates() -> Result<(), CodingError> {
        let arena =
            CategoryArena::from_categories([category(1, Some(2), None), category(2, Some(1), None)]);

        let resolved = arena.resolve(CategoryId::new(1), 8)?;
        assert!(matches!(
            resolved.source,
            TemplateSource::BusinessTypeDefault(_)
        ));
        Ok(())
    }

    #[test]
    fn depth_cap_stops_before_distant_template() -> Result<(), CodingError> {
        let arena = CategoryArena::from_categories([
            category(1, None, Some("{cat}-{root}")),
            category(2, Some(1), None),
            category(3, Some(2), None),
        ]);

        assert_eq!(
            arena.resolve(CategoryId::new(3), 3)?.template.as_ref(),
            "{cat}-{root}"
        );
        assert_eq!(
            arena.resolve(CategoryId::new(3), 2)?.template.as_ref(),
            "{cat}-{brand}-{model}-{year}"
        );
        Ok(())
    }

    #[test]
    fn unknown_category_is_not_found() {
        let arena = CategoryArena::from_categories([category(1, None, None)]);
        assert_eq!(
            arena.resolve(CategoryId::new(9), 32).err(),
            Some(CodingError::CategoryNotFound {
                category_id: CategoryId::new(9)
            })
        );
        assert_eq!(arena.len(), 1);
        assert!(arena.get(CategoryId::new(1)).is_some());
    }

    #[test]
    fn lineage_is_nearest_first_and_bounded() {
        let arena = CategoryArena::from_categories([
            category(1, Some(3), None),
            category(2, Some(1), None),
            category(3, Some(2), None),
            category(4, Some(3), None),
        ]);

        let ids = |depth| {
            arena
                .lineage(CategoryId::new(4), depth)
                .iter()
                .map(|node| node.id.get())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(32), vec![4, 3, 2, 1]);
        assert_eq!(ids(2), vec![4, 3]);
        assert!(arena.lineage(CategoryId::new(9), 32).is_empty());
    }
}
