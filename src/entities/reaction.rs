//! Event-triggered reactions: ordered cell writes attached to one element.

use serde::{Deserialize, Serialize};

use super::value::{CellId, CellValue};

/// Event that fires a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    #[default]
    Click,
    Press,
}

/// Single `cell := value` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellWrite {
    pub cell: CellId,
    pub value: CellValue,
}

/// Rule installed on an element. At most one write per cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub trigger: TriggerKind,
    pub actions: Vec<CellWrite>,
}

impl Reaction {
    pub fn new(trigger: TriggerKind) -> Self {
        Self {
            trigger,
            actions: Vec::new(),
        }
    }

    /// Append a write; a second write to the same cell replaces the first.
    pub fn push(&mut self, cell: CellId, value: CellValue) {
        if let Some(existing) = self.actions.iter_mut().find(|w| w.cell == cell) {
            existing.value = value;
        } else {
            self.actions.push(CellWrite { cell, value });
        }
    }

    pub fn write_for(&self, cell: &CellId) -> Option<&CellValue> {
        self.actions.iter().find(|w| &w.cell == cell).map(|w| &w.value)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}
