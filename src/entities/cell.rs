//! Shared state cells and the per-run cell table.
//!
//! The host only knows cells by id and by name. Inside a run every cell is
//! addressed by `(element_index, property)`; the composite host name is
//! derived from that key and never parsed back.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::keys::CELL_NAME_SEP;
use super::value::{CellId, CellType, CellValue, NamespaceId};

/// Host-side view of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellInfo {
    pub id: CellId,
    pub name: String,
    pub namespace: NamespaceId,
    pub cell_type: CellType,
    pub value: CellValue,
}

/// Composite key of a cell inside one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub element_index: usize,
    pub property: String,
}

impl CellKey {
    pub fn new(element_index: usize, property: impl Into<String>) -> Self {
        Self {
            element_index,
            property: property.into(),
        }
    }
}

/// Host name for the cell of `property` on the element at `index`.
///
/// The index suffix keeps names unique when display names repeat.
pub fn cell_name(element_name: &str, property: &str, index: usize) -> String {
    format!("{element_name}{CELL_NAME_SEP}{property}{CELL_NAME_SEP}{index}")
}

/// One allocated cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub key: CellKey,
    pub id: CellId,
    pub name: String,
    /// Type reported by the host
    pub cell_type: CellType,
    /// Type the coercer derived for the property in this run
    pub expected_type: CellType,
    /// Value last observed on the host
    pub value: CellValue,
    /// Schema default, coerced to `cell_type`
    pub default: Option<CellValue>,
    /// Created during this run (false when reused by name)
    pub created: bool,
}

impl CellRecord {
    /// Reused cell whose stored type no longer matches the property.
    pub fn type_mismatch(&self) -> bool {
        self.cell_type != self.expected_type
    }
}

/// Cells of one run, in allocation order.
#[derive(Debug, Clone, Default)]
pub struct CellTable {
    cells: IndexMap<CellKey, CellRecord>,
}

impl CellTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. An existing record with the same key is kept.
    pub fn insert(&mut self, record: CellRecord) -> bool {
        if self.cells.contains_key(&record.key) {
            return false;
        }
        self.cells.insert(record.key.clone(), record);
        true
    }

    pub fn get(&self, element_index: usize, property: &str) -> Option<&CellRecord> {
        self.cells.get(&CellKey::new(element_index, property))
    }

    pub fn get_mut(&mut self, key: &CellKey) -> Option<&mut CellRecord> {
        self.cells.get_mut(key)
    }

    pub fn remove(&mut self, key: &CellKey) -> Option<CellRecord> {
        self.cells.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellRecord> {
        self.cells.values()
    }

    pub fn keys(&self) -> Vec<CellKey> {
        self.cells.keys().cloned().collect()
    }

    /// Cells owned by one element, in allocation order.
    pub fn for_element(&self, element_index: usize) -> impl Iterator<Item = &CellRecord> {
        self.cells
            .values()
            .filter(move |c| c.key.element_index == element_index)
    }

    pub fn created_count(&self) -> usize {
        self.cells.values().filter(|c| c.created).count()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
