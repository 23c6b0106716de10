//! Product persistence boundary contract.

use crate::BoxFuture;
pub use skucode_domain::CommitOutcome;
use skucode_domain::{ProductFamily, ProductVariant, ShortCodePrefix};
use skucode_shared::{RequestContext, Result};

/// Family plus the variants generated for it in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyCommit {
    /// Family to find or create (matched by family code).
    pub family: ProductFamily,
    /// Variants to create or merge (matched by short code).
    pub variants: Vec<ProductVariant>,
}

/// Boundary contract for families and variants.
///
/// Implementations must enforce short-code uniqueness: committing a short
/// code owned by another family fails with the retriable
/// `coding:code_collision` error and leaves the store unchanged.
pub trait ProductStorePort: Send + Sync {
    /// Family by its rendered code.
    fn find_family(
        &self,
        ctx: &RequestContext,
        family_code: Box<str>,
    ) -> BoxFuture<'_, Result<Option<ProductFamily>>>;

    /// Persisted variants of a family.
    fn family_variants(
        &self,
        ctx: &RequestContext,
        family_code: Box<str>,
    ) -> BoxFuture<'_, Result<Vec<ProductVariant>>>;

    /// Highest serial issued under `prefix` across all families.
    fn max_serial_for_prefix(
        &self,
        ctx: &RequestContext,
        prefix: ShortCodePrefix,
    ) -> BoxFuture<'_, Result<Option<u32>>>;

    /// Atomically find-or-create the family and create-or-merge its variants.
    fn commit_family(
        &self,
        ctx: &RequestContext,
        commit: FamilyCommit,
    ) -> BoxFuture<'_, Result<CommitOutcome>>;
}
