//! In-memory host: a serializable scene plus a cell store.
//!
//! Used as the test fixture for the synthesis engine and as the backing
//! store of the CLI harness. Besides the plain [`SceneHost`] / [`StateHost`]
//! contract it can simulate host behaviour the engine must survive:
//! - settling lag: new cells stay invisible to `cell_by_id` for a few polls
//! - broken instances: property reads raise `Structural`
//! - transient bind / reaction failures
//!
//! Scenes are saved and loaded via `MemoryHost::to_json` / `MemoryHost::from_json`.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{HostError, HostResult, SceneHost, StateHost};
use crate::entities::{
    CellId, CellInfo, CellType, CellValue, ComponentId, ComponentInfo, ComponentSchema, NamespaceId,
    NodeId, NodeInfo, NodeKind, PropValue, PropertyMap, Reaction,
};

/// Scene node as stored by the memory host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: PropertyMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentId>,
    /// Detached component reference: property reads fail
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub broken: bool,
}

/// Component or variant set definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_set: Option<ComponentId>,
    #[serde(default, skip_serializing_if = "ComponentSchema::is_empty")]
    pub schema: ComponentSchema,
}

/// Injected failures (runtime only).
#[derive(Debug, Default)]
pub struct Faults {
    /// Polls a freshly created cell stays invisible to `cell_by_id`
    pub visibility_lag: u32,
    /// Remaining `set_reactions` failures per node
    pub reaction_failures: HashMap<NodeId, u32>,
    /// Nodes whose host rejects reactions with more than one action
    pub reject_multi_write: HashSet<NodeId>,
    /// `(node, property)` pairs whose binding always fails
    pub binding_failures: HashSet<(NodeId, String)>,
    /// Components whose schema read raises
    pub schema_failures: HashSet<ComponentId>,
    /// Never settle cells with these names
    pub never_visible: HashSet<String>,
    /// Property reads left before a node behaves as detached
    pub detach_after_reads: RefCell<HashMap<NodeId, u32>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryHost {
    #[serde(default)]
    pub selection: Vec<NodeId>,
    /// Top-level nodes of the current page
    #[serde(default)]
    pub page: Vec<NodeId>,
    #[serde(default)]
    pub nodes: IndexMap<NodeId, SceneNode>,
    #[serde(default)]
    pub components: IndexMap<ComponentId, ComponentDef>,
    /// Namespace id -> name
    #[serde(default)]
    pub namespaces: IndexMap<NamespaceId, String>,
    #[serde(default)]
    pub cells: IndexMap<CellId, CellInfo>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub reactions: IndexMap<NodeId, Vec<Reaction>>,

    #[serde(skip)]
    pub faults: Faults,
    /// Remaining invisible polls per unsettled cell
    #[serde(skip)]
    pending: RefCell<HashMap<CellId, u32>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    // === Scene building ===

    pub fn add_component(
        &mut self,
        id: &str,
        name: &str,
        parent_set: Option<&str>,
        schema: ComponentSchema,
    ) -> ComponentId {
        let id = ComponentId::from(id);
        self.components.insert(
            id.clone(),
            ComponentDef {
                name: name.to_string(),
                parent_set: parent_set.map(ComponentId::from),
                schema,
            },
        );
        id
    }

    /// Add a node, optionally as the last child of `parent`.
    pub fn add_node(&mut self, parent: Option<&NodeId>, id: &str, node: SceneNode) -> NodeId {
        let id = NodeId::from(id);
        match parent {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(parent) {
                    parent.children.push(id.clone());
                }
            }
            None => self.page.push(id.clone()),
        }
        self.nodes.insert(id.clone(), node);
        id
    }

    pub fn add_frame(&mut self, parent: Option<&NodeId>, id: &str, name: &str) -> NodeId {
        self.add_node(
            parent,
            id,
            SceneNode {
                name: name.to_string(),
                kind: NodeKind::Frame,
                ..Default::default()
            },
        )
    }

    pub fn add_instance(
        &mut self,
        parent: Option<&NodeId>,
        id: &str,
        name: &str,
        component: &str,
        properties: &[(&str, PropValue)],
    ) -> NodeId {
        self.add_node(
            parent,
            id,
            SceneNode {
                name: name.to_string(),
                kind: NodeKind::Instance,
                properties: properties
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                component: Some(ComponentId::from(component)),
                ..Default::default()
            },
        )
    }

    pub fn select(&mut self, ids: &[&NodeId]) {
        self.selection = ids.iter().map(|id| (*id).clone()).collect();
    }

    pub fn mark_broken(&mut self, id: &NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.broken = true;
        }
    }

    // === Inspection ===

    /// Effective value of a property: literal, or the bound cell's value.
    pub fn effective_value(&self, node: &NodeId, property: &str) -> Option<CellValue> {
        match self.nodes.get(node)?.properties.get(property)? {
            PropValue::Cell { cell } => self.cells.get(cell).map(|c| c.value.clone()),
            other => other.literal(),
        }
    }

    pub fn cells_in(&self, namespace: &str) -> Vec<&CellInfo> {
        self.namespaces
            .iter()
            .filter(|(_, name)| name.as_str() == namespace)
            .flat_map(|(id, _)| self.cells.values().filter(move |c| &c.namespace == id))
            .collect()
    }

    /// Execute the reactions installed on `node`. Returns the number of writes applied.
    pub fn fire(&mut self, node: &NodeId) -> HostResult<usize> {
        let reactions = self
            .reactions
            .get(node)
            .cloned()
            .ok_or_else(|| HostError::not_found("reaction", node))?;
        let mut applied = 0;
        for write in reactions.iter().flat_map(|r| r.actions.iter()) {
            let cell = self
                .cells
                .get_mut(&write.cell)
                .ok_or_else(|| HostError::not_found("cell", &write.cell))?;
            cell.value = write.value.clone();
            applied += 1;
        }
        debug!("fire {}: {} writes", node, applied);
        Ok(applied)
    }

    // === Persistence ===

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize scene")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse scene JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene: {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write scene: {}", path.display()))
    }

    fn instance(&self, id: &NodeId) -> HostResult<&SceneNode> {
        let node = self.nodes.get(id).ok_or_else(|| HostError::not_found("node", id))?;
        if node.broken {
            return Err(HostError::Structural {
                node: id.clone(),
                reason: "component reference is detached".into(),
            });
        }
        Ok(node)
    }

    fn is_visible(&self, id: &CellId) -> bool {
        !self.pending.borrow().contains_key(id)
    }
}

impl SceneHost for MemoryHost {
    fn selection(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn page(&self) -> HostResult<Vec<NodeId>> {
        Ok(self.page.clone())
    }

    fn node(&self, id: &NodeId) -> HostResult<NodeInfo> {
        let node = self.nodes.get(id).ok_or_else(|| HostError::not_found("node", id))?;
        Ok(NodeInfo {
            id: id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            children: node.children.clone(),
        })
    }

    fn properties(&self, id: &NodeId) -> HostResult<PropertyMap> {
        let node = self.instance(id)?;
        if let Some(remaining) = self.faults.detach_after_reads.borrow_mut().get_mut(id) {
            if *remaining == 0 {
                return Err(HostError::Structural {
                    node: id.clone(),
                    reason: "component reference detached".into(),
                });
            }
            *remaining -= 1;
        }
        Ok(node.properties.clone())
    }

    fn main_component(&self, id: &NodeId) -> HostResult<Option<ComponentInfo>> {
        let node = self.instance(id)?;
        let Some(component_id) = &node.component else {
            return Ok(None);
        };
        let def = self
            .components
            .get(component_id)
            .ok_or_else(|| HostError::Structural {
                node: id.clone(),
                reason: format!("missing component {}", component_id),
            })?;
        Ok(Some(ComponentInfo {
            id: component_id.clone(),
            name: def.name.clone(),
            parent_set: def.parent_set.clone(),
        }))
    }

    fn component_schema(&self, id: &ComponentId) -> HostResult<ComponentSchema> {
        if self.faults.schema_failures.contains(id) {
            return Err(HostError::Transient(format!("schema of {} unavailable", id)));
        }
        self.components
            .get(id)
            .map(|c| c.schema.clone())
            .ok_or_else(|| HostError::not_found("component", id))
    }

    fn bind_property(&mut self, node: &NodeId, property: &str, cell: &CellId) -> HostResult<()> {
        if self
            .faults
            .binding_failures
            .contains(&(node.clone(), property.to_string()))
        {
            return Err(HostError::Transient(format!("bind {}.{} raised", node, property)));
        }
        if !self.cells.contains_key(cell) || !self.is_visible(cell) {
            return Err(HostError::Rejected(format!("cell {} is not visible", cell)));
        }
        self.instance(node)?;
        let slot = self
            .nodes
            .get_mut(node)
            .and_then(|n| n.properties.get_mut(property))
            .ok_or_else(|| HostError::not_found("property", format!("{}.{}", node, property)))?;
        *slot = PropValue::Cell { cell: cell.clone() };
        trace!("bind {}.{} -> {}", node, property, cell);
        Ok(())
    }

    fn set_reactions(&mut self, node: &NodeId, reactions: Vec<Reaction>) -> HostResult<()> {
        if let Some(remaining) = self.faults.reaction_failures.get_mut(node) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(HostError::Transient(format!("set_reactions on {} raised", node)));
            }
        }
        if self.faults.reject_multi_write.contains(node) && reactions.iter().any(|r| r.len() > 1) {
            return Err(HostError::Transient(format!(
                "set_reactions on {} raised for multi-write rule",
                node
            )));
        }
        if !self.nodes.contains_key(node) {
            return Err(HostError::not_found("node", node));
        }
        if let Some(missing) = reactions
            .iter()
            .flat_map(|r| r.actions.iter())
            .find(|w| !self.cells.contains_key(&w.cell))
        {
            return Err(HostError::Rejected(format!("unknown cell {}", missing.cell)));
        }
        self.reactions.insert(node.clone(), reactions);
        Ok(())
    }

    fn reactions(&self, node: &NodeId) -> HostResult<Vec<Reaction>> {
        Ok(self.reactions.get(node).cloned().unwrap_or_default())
    }

    fn create_frame(&mut self, parent: Option<&NodeId>, name: &str) -> HostResult<NodeId> {
        if let Some(parent) = parent {
            if !self.nodes.contains_key(parent) {
                return Err(HostError::not_found("node", parent));
            }
        }
        let id = Uuid::new_v4().to_string();
        Ok(self.add_frame(parent, &id, name))
    }
}

impl StateHost for MemoryHost {
    fn find_namespace(&self, name: &str) -> HostResult<Option<NamespaceId>> {
        Ok(self
            .namespaces
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| id.clone()))
    }

    fn create_namespace(&mut self, name: &str) -> HostResult<NamespaceId> {
        let id = NamespaceId::new(Uuid::new_v4().to_string());
        self.namespaces.insert(id.clone(), name.to_string());
        Ok(id)
    }

    fn find_cell(&self, namespace: &NamespaceId, name: &str) -> HostResult<Option<CellInfo>> {
        Ok(self
            .cells
            .values()
            .find(|c| &c.namespace == namespace && c.name == name)
            .cloned())
    }

    fn create_cell(
        &mut self,
        namespace: &NamespaceId,
        name: &str,
        cell_type: CellType,
        value: CellValue,
    ) -> HostResult<CellId> {
        if !self.namespaces.contains_key(namespace) {
            return Err(HostError::not_found("namespace", namespace));
        }
        if value.cell_type() != cell_type {
            return Err(HostError::Rejected(format!(
                "value {} does not fit {} cell {}",
                value, cell_type, name
            )));
        }
        let id = CellId::new(Uuid::new_v4().to_string());
        self.cells.insert(
            id.clone(),
            CellInfo {
                id: id.clone(),
                name: name.to_string(),
                namespace: namespace.clone(),
                cell_type,
                value,
            },
        );
        let lag = if self.faults.never_visible.contains(name) {
            u32::MAX
        } else {
            self.faults.visibility_lag
        };
        if lag > 0 {
            self.pending.borrow_mut().insert(id.clone(), lag);
        }
        Ok(id)
    }

    fn cell_by_id(&self, id: &CellId) -> HostResult<Option<CellInfo>> {
        let mut pending = self.pending.borrow_mut();
        if let Some(remaining) = pending.get_mut(id) {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                pending.remove(id);
            }
            return Ok(None);
        }
        Ok(self.cells.get(id).cloned())
    }

    fn set_cell_value(&mut self, id: &CellId, value: CellValue) -> HostResult<()> {
        let cell = self.cells.get_mut(id).ok_or_else(|| HostError::not_found("cell", id))?;
        if value.cell_type() != cell.cell_type {
            return Err(HostError::Rejected(format!("{} cell {} cannot hold {}", cell.cell_type, id, value)));
        }
        cell.value = value;
        Ok(())
    }

    fn cell_ids(&self, namespace: &NamespaceId) -> HostResult<Vec<CellId>> {
        Ok(self
            .cells
            .values()
            .filter(|c| &c.namespace == namespace)
            .map(|c| c.id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_lag() {
        let mut host = MemoryHost::new();
        host.faults.visibility_lag = 2;
        let ns = host.create_namespace("Tabs").unwrap();
        let id = host
            .create_cell(&ns, "Tab_State_0", CellType::String, CellValue::Str("Idle".into()))
            .unwrap();

        // Name lookup sees it, id lookup lags
        assert!(host.find_cell(&ns, "Tab_State_0").unwrap().is_some());
        assert!(host.cell_by_id(&id).unwrap().is_none());
        assert!(host.cell_by_id(&id).unwrap().is_none());
        assert!(host.cell_by_id(&id).unwrap().is_some());
    }

    #[test]
    fn test_broken_instance_raises_structural() {
        let mut host = MemoryHost::new();
        let id = host.add_instance(None, "1:1", "Tab", "c1", &[]);
        host.mark_broken(&id);
        let err = host.properties(&id).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_detach_after_reads() {
        let mut host = MemoryHost::new();
        let id = host.add_instance(None, "1:1", "Tab", "c1", &[]);
        host.faults.detach_after_reads.borrow_mut().insert(id.clone(), 1);
        assert!(host.properties(&id).is_ok());
        assert!(host.properties(&id).unwrap_err().is_structural());
        // Schema lookups are unaffected
        assert!(host.node(&id).is_ok());
    }

    #[test]
    fn test_fire_applies_writes() {
        let mut host = MemoryHost::new();
        let ns = host.create_namespace("Tabs").unwrap();
        let cell = host
            .create_cell(&ns, "Tab_On_0", CellType::Boolean, CellValue::Bool(false))
            .unwrap();
        let node = host.add_instance(None, "1:1", "Tab", "c1", &[("On", PropValue::Bool(false))]);
        host.bind_property(&node, "On", &cell).unwrap();

        let mut reaction = Reaction::new(Default::default());
        reaction.push(cell.clone(), CellValue::Bool(true));
        host.set_reactions(&node, vec![reaction]).unwrap();

        assert_eq!(host.fire(&node).unwrap(), 1);
        assert_eq!(host.effective_value(&node, "On"), Some(CellValue::Bool(true)));
    }

    #[test]
    fn test_cell_values_and_enumeration() {
        let mut host = MemoryHost::new();
        let ns = host.create_namespace("Tabs").unwrap();
        let other = host.create_namespace("Chips").unwrap();
        let a = host
            .create_cell(&ns, "Tab_On_0", CellType::Boolean, CellValue::Bool(false))
            .unwrap();
        host.create_cell(&other, "Chip_On_0", CellType::Boolean, CellValue::Bool(false))
            .unwrap();

        assert_eq!(host.cell_ids(&ns).unwrap(), vec![a.clone()]);
        host.set_cell_value(&a, CellValue::Bool(true)).unwrap();
        assert_eq!(host.cell_by_id(&a).unwrap().map(|c| c.value), Some(CellValue::Bool(true)));
        assert!(matches!(
            host.set_cell_value(&a, CellValue::Str("yes".into())),
            Err(HostError::Rejected(_))
        ));
        assert_eq!(host.cells_in("Chips").len(), 1);
    }

    #[test]
    fn test_create_frame() {
        let mut host = MemoryHost::new();
        let root = host.create_frame(None, "Tabs").unwrap();
        let child = host.create_frame(Some(&root), "Row").unwrap();
        assert_eq!(host.node(&root).unwrap().children, vec![child]);
        assert_eq!(host.page().unwrap(), vec![root]);
        assert!(host.create_frame(Some(&NodeId::from("404")), "X").is_err());
    }

    #[test]
    fn test_scene_json_roundtrip() {
        let mut host = MemoryHost::new();
        let frame = host.add_frame(None, "1:0", "Row");
        host.add_instance(Some(&frame), "1:1", "Tab", "c1", &[("State", PropValue::Str("Idle".into()))]);
        host.select(&[&frame]);

        let restored = MemoryHost::from_json(&host.to_json().unwrap()).unwrap();
        assert_eq!(restored.selection, vec![frame.clone()]);
        assert_eq!(restored.nodes[&frame].children, vec![NodeId::from("1:1")]);
        assert_eq!(
            restored.effective_value(&NodeId::from("1:1"), "State"),
            Some(CellValue::Str("Idle".into()))
        );
    }
}
