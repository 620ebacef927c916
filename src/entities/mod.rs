//! Entities module - plain data shared by the host layer and the synthesis engine
//!
//! - Values and ids exchanged with the host (value.rs)
//! - Property schemas (schema.rs)
//! - Scene nodes and discovered elements (element.rs)
//! - User-declared behaviors (behavior.rs)
//! - Cells and reactions produced by synthesis (cell.rs, reaction.rs)

pub mod behavior;
pub mod cell;
pub mod element;
pub mod keys;
pub mod reaction;
pub mod schema;
pub mod value;

pub use behavior::{BehaviorGroup, BehaviorList, Semantics, Target};
pub use cell::{cell_name, CellInfo, CellKey, CellRecord, CellTable};
pub use element::{ComponentInfo, Element, NodeInfo, NodeKind, PropertyMap};
pub use reaction::{CellWrite, Reaction, TriggerKind};
pub use schema::{ComponentSchema, PropertyKind, PropertySchemaEntry};
pub use value::{CellId, CellType, CellValue, ComponentId, NamespaceId, NodeId, PropValue};
