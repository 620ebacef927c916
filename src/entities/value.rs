//! Identifiers and values exchanged with the host.
//!
//! Properties on an element hold either a literal (`Bool` / `Str`) or a
//! reference to a shared cell. Cells themselves only ever hold literals,
//! typed as either `STRING` or `BOOLEAN`.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! host_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

host_id!(
    /// Stable identifier of a scene node (elements, frames, groups)
    NodeId
);
host_id!(
    /// Identifier of a component definition or a variant set
    ComponentId
);
host_id!(
    /// Identifier of a shared state cell
    CellId
);
host_id!(
    /// Identifier of a cell namespace ("collection")
    NamespaceId
);

/// Canonical storage type of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CellType {
    String,
    Boolean,
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellType::String => f.write_str("STRING"),
            CellType::Boolean => f.write_str("BOOLEAN"),
        }
    }
}

/// Literal value held by a cell or by an unbound property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Str(String),
}

impl CellValue {
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Bool(_) => CellType::Boolean,
            CellValue::Str(_) => CellType::String,
        }
    }

    /// Textual form, used for boolean-token inference and enum membership.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Bool(b) => b.to_string(),
            CellValue::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Value of one element property as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Str(String),
    /// Bound: effective value is the cell's current value
    Cell { cell: CellId },
}

impl PropValue {
    pub fn literal(&self) -> Option<CellValue> {
        match self {
            PropValue::Bool(b) => Some(CellValue::Bool(*b)),
            PropValue::Str(s) => Some(CellValue::Str(s.clone())),
            PropValue::Cell { .. } => None,
        }
    }

    pub fn bound_cell(&self) -> Option<&CellId> {
        match self {
            PropValue::Cell { cell } => Some(cell),
            _ => None,
        }
    }
}

impl From<CellValue> for PropValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Bool(b) => PropValue::Bool(b),
            CellValue::Str(s) => PropValue::Str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prop_value_json_shapes() {
        let props: Vec<PropValue> =
            serde_json::from_str(r#"[true, "Active", {"cell": "c1"}]"#).unwrap();
        assert_eq!(props[0], PropValue::Bool(true));
        assert_eq!(props[1], PropValue::Str("Active".into()));
        assert_eq!(props[2].bound_cell(), Some(&CellId::from("c1")));
        assert_eq!(props[2].literal(), None);
    }

    #[test]
    fn test_cell_value_text() {
        assert_eq!(CellValue::Bool(true).as_text(), "true");
        assert_eq!(CellValue::Str("Idle".into()).cell_type(), CellType::String);
        assert_eq!(serde_json::to_string(&CellType::Boolean).unwrap(), "\"BOOLEAN\"");
    }
}
