//! Schema resolution with variant-set inheritance.
//!
//! If an instance's defining component is one variant of a variant set, the
//! property schema lives on the set; otherwise on the component itself.
//! Lookups never fail past this boundary: every host error degrades to
//! "no schema" and callers fall back to value-based inference.

use log::{debug, warn};

use crate::entities::{ComponentId, ComponentSchema, NodeId, PropertySchemaEntry};
use crate::host::{HostResult, SceneHost};

/// Component that owns the schema for `node` (the variant set when present).
pub fn schema_owner<H: SceneHost + ?Sized>(host: &H, node: &NodeId) -> HostResult<Option<ComponentId>> {
    Ok(host
        .main_component(node)?
        .map(|component| component.parent_set.unwrap_or(component.id)))
}

/// Full schema for `node`, or `None` if undiscoverable.
pub fn resolve_component_schema<H: SceneHost + ?Sized>(host: &H, node: &NodeId) -> Option<ComponentSchema> {
    let lookup = || -> HostResult<Option<ComponentSchema>> {
        match schema_owner(host, node)? {
            Some(owner) => Ok(Some(host.component_schema(&owner)?)),
            None => Ok(None),
        }
    };
    match lookup() {
        Ok(schema) => schema,
        Err(e) => {
            warn!("Schema for {} unavailable, using value inference: {}", node, e);
            None
        }
    }
}

/// Schema entry for `property` on `node`.
pub fn resolve_schema<H: SceneHost + ?Sized>(
    host: &H,
    node: &NodeId,
    property: &str,
) -> Option<PropertySchemaEntry> {
    let entry = resolve_component_schema(host, node)?.get(property).cloned();
    if entry.is_none() {
        debug!("No schema entry for {}.{}", node, property);
    }
    entry
}
