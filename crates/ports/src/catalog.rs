//! Read-only catalog boundary contract.
//!
//! The engine never writes categories, attribute definitions or vehicle
//! nodes; it only looks them up for one generation call.

use crate::BoxFuture;
use skucode_domain::{
    AttributeDefinition, Category, CategoryAttributeOverride, CategoryId, VehicleNode,
    VehicleNodeId,
};
use skucode_shared::{RequestContext, Result};

/// Boundary contract for catalog lookups.
pub trait CatalogPort: Send + Sync {
    /// Categories from `category_id` towards the root, nearest first.
    ///
    /// At most `max_depth` records are returned, and the walk stops early on
    /// a repeated id. An unknown `category_id` yields an empty list.
    fn category_lineage(
        &self,
        ctx: &RequestContext,
        category_id: CategoryId,
        max_depth: u32,
    ) -> BoxFuture<'_, Result<Vec<Category>>>;

    /// Vehicle node by id, if it exists.
    fn vehicle_node(
        &self,
        ctx: &RequestContext,
        node_id: VehicleNodeId,
    ) -> BoxFuture<'_, Result<Option<VehicleNode>>>;

    /// Definitions for the requested keys; unknown keys are omitted.
    fn attribute_definitions(
        &self,
        ctx: &RequestContext,
        keys: Vec<Box<str>>,
    ) -> BoxFuture<'_, Result<Vec<AttributeDefinition>>>;

    /// Overrides of `category_id` for the requested keys.
    fn category_overrides(
        &self,
        ctx: &RequestContext,
        category_id: CategoryId,
        keys: Vec<Box<str>>,
    ) -> BoxFuture<'_, Result<Vec<CategoryAttributeOverride>>>;
}
