//! Scene nodes and the candidate elements discovered among them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::{ComponentId, NodeId, PropValue};

/// Kind of a scene node. Only `Instance` nodes are interaction candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Frame,
    Group,
    Instance,
    Component,
    Text,
}

/// Snapshot of a scene node's structure (no property values).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

/// Defining component of an instance.
///
/// `parent_set` is set when the component is one variant of a variant set;
/// the set then owns the property schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInfo {
    pub id: ComponentId,
    pub name: String,
    pub parent_set: Option<ComponentId>,
}

/// Property map of an element, in host order.
pub type PropertyMap = IndexMap<String, PropValue>;

/// A discovered interaction candidate.
///
/// `index` is the position in the filtered candidate list and is part of
/// every cell key owned by this element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: NodeId,
    pub name: String,
    pub index: usize,
    pub properties: PropertyMap,
}

impl Element {
    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.properties.get(name)
    }
}
