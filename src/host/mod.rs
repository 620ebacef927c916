//! Abstract host interfaces for dependency inversion.
//!
//! The synthesis engine never talks to a concrete design tool. It needs two
//! collaborators:
//! - [`SceneHost`]: selection, node tree, property maps, components,
//!   property rewiring and reaction installation
//! - [`StateHost`]: namespaces and cells
//!
//! Hosts settle writes asynchronously: a call returning `Ok` means the host
//! accepted the request, not that every read path already observes it. The
//! engine re-fetches by id before linking anything (see `synth::settle`).
//!
//! [`MemoryHost`] is the in-process implementation used by tests and the CLI.

pub mod memory;

pub use memory::MemoryHost;

use thiserror::Error;

use crate::entities::{
    CellId, CellInfo, CellType, CellValue, ComponentId, ComponentInfo, ComponentSchema, NamespaceId,
    NodeId, NodeInfo, PropertyMap, Reaction,
};

/// Failure raised by a host call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Corrupted or detached component reference
    #[error("structural error on {node}: {reason}")]
    Structural { node: NodeId, reason: String },
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },
    /// Call raised but may succeed if retried or reduced
    #[error("transient host failure: {0}")]
    Transient(String),
    /// Host refused the value or type
    #[error("host rejected request: {0}")]
    Rejected(String),
}

impl HostError {
    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        HostError::NotFound {
            what,
            id: id.to_string(),
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, HostError::Structural { .. })
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// Scene graph and property API.
pub trait SceneHost {
    /// Currently selected nodes, in selection order.
    fn selection(&self) -> Vec<NodeId>;

    /// Top-level nodes of the current page.
    fn page(&self) -> HostResult<Vec<NodeId>>;

    /// Structure of one node.
    fn node(&self, id: &NodeId) -> HostResult<NodeInfo>;

    /// Property map of an instance. Raises `Structural` for broken instances.
    fn properties(&self, id: &NodeId) -> HostResult<PropertyMap>;

    /// Defining component of an instance (`None` for non-instances).
    fn main_component(&self, id: &NodeId) -> HostResult<Option<ComponentInfo>>;

    /// Property schema declared on a component or a variant set.
    fn component_schema(&self, id: &ComponentId) -> HostResult<ComponentSchema>;

    /// Rewire `property` on `node` to read from `cell`. Re-binding to the
    /// same cell is a no-op.
    fn bind_property(&mut self, node: &NodeId, property: &str, cell: &CellId) -> HostResult<()>;

    /// Replace the node's whole reaction set.
    fn set_reactions(&mut self, node: &NodeId, reactions: Vec<Reaction>) -> HostResult<()>;

    fn reactions(&self, node: &NodeId) -> HostResult<Vec<Reaction>>;

    /// Create an empty frame under `parent`, or on the current page.
    fn create_frame(&mut self, parent: Option<&NodeId>, name: &str) -> HostResult<NodeId>;
}

/// Shared-state (cells) API.
pub trait StateHost {
    fn find_namespace(&self, name: &str) -> HostResult<Option<NamespaceId>>;

    fn create_namespace(&mut self, name: &str) -> HostResult<NamespaceId>;

    /// Exact-name lookup inside one namespace.
    fn find_cell(&self, namespace: &NamespaceId, name: &str) -> HostResult<Option<CellInfo>>;

    fn create_cell(
        &mut self,
        namespace: &NamespaceId,
        name: &str,
        cell_type: CellType,
        value: CellValue,
    ) -> HostResult<CellId>;

    /// Lookup by id. `None` until the host has settled the creation.
    fn cell_by_id(&self, id: &CellId) -> HostResult<Option<CellInfo>>;

    fn set_cell_value(&mut self, id: &CellId, value: CellValue) -> HostResult<()>;

    fn cell_ids(&self, namespace: &NamespaceId) -> HostResult<Vec<CellId>>;
}

/// Everything the orchestrator needs.
pub trait Host: SceneHost + StateHost {}

impl<T: SceneHost + StateHost> Host for T {}
