//! In-memory family/variant registry with short-code uniqueness.

use crate::catalog::{ProductFamily, ProductVariant};
use crate::error::CodingError;
use crate::grouping::{ShortCodePrefix, max_serial_in};
use serde::Serialize;
use std::collections::BTreeMap;

/// What a commit changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    /// The family did not exist before.
    pub family_created: bool,
    /// Variants inserted.
    pub created: usize,
    /// Existing variants whose mutable fields were updated.
    pub merged: usize,
}

/// Families keyed by family code and variants keyed by short code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductRegistry {
    families: BTreeMap<Box<str>, ProductFamily>,
    variants: BTreeMap<Box<str>, ProductVariant>,
}

impl ProductRegistry {
    /// Seed a registry from persisted records.
    ///
    /// Later records with a duplicate key replace earlier ones.
    #[must_use]
    pub fn from_records(
        families: impl IntoIterator<Item = ProductFamily>,
        variants: impl IntoIterator<Item = ProductVariant>,
    ) -> Self {
        Self {
            families: families
                .into_iter()
                .map(|family| (family.family_code.clone(), family))
                .collect(),
            variants: variants
                .into_iter()
                .map(|variant| (variant.short_code.clone(), variant))
                .collect(),
        }
    }

    /// Family by code.
    #[must_use]
    pub fn family(&self, family_code: &str) -> Option<&ProductFamily> {
        self.families.get(family_code)
    }

    /// Variants owned by `family_code`, in short-code order.
    pub fn family_variants<'a>(
        &'a self,
        family_code: &'a str,
    ) -> impl Iterator<Item = &'a ProductVariant> + 'a {
        self.variants
            .values()
            .filter(move |variant| variant.family_code.as_ref() == family_code)
    }

    /// Highest serial issued under `prefix` by any family.
    #[must_use]
    pub fn max_serial(&self, prefix: &ShortCodePrefix) -> Option<u32> {
        max_serial_in(prefix, self.variants.keys().map(|code| &**code))
    }

    /// All families, in code order.
    pub fn families(&self) -> impl Iterator<Item = &ProductFamily> {
        self.families.values()
    }

    /// All variants, in short-code order.
    pub fn variants(&self) -> impl Iterator<Item = &ProductVariant> {
        self.variants.values()
    }

    /// Find-or-create `family`, then create-or-merge `variants`.
    ///
    /// Every short code is checked before anything is written, so a
    /// collision leaves the registry untouched.
    pub fn commit(
        &mut self,
        family: ProductFamily,
        variants: Vec<ProductVariant>,
    ) -> Result<CommitOutcome, CodingError> {
        if let Some(collision) = variants.iter().find_map(|variant| {
            let owner = self.variants.get(&variant.short_code)?;
            (owner.family_code != family.family_code).then(|| CodingError::CodeCollision {
                short_code: variant.short_code.clone(),
                family_code: family.family_code.clone(),
                owner_family_code: owner.family_code.clone(),
            })
        }) {
            return Err(collision);
        }

        let mut outcome = CommitOutcome {
            family_created: !self.families.contains_key(&family.family_code),
            ..CommitOutcome::default()
        };
        let family_code = family.family_code.clone();
        self.families.entry(family_code.clone()).or_insert(family);

        for mut variant in variants {
            variant.family_code.clone_from(&family_code);
            match self.variants.get_mut(&variant.short_code) {
                Some(existing) => {
                    existing.merge_from(&variant);
                    outcome.merged += 1;
                },
                None => {
                    self.variants.insert(variant.short_code.clone(), variant);
                    outcome.created += 1;
                },
            }
        }
        Ok(outcome)
    }
}
