//! Property schemas declared by components and variant sets.
//!
//! A schema entry describes one property: its kind, the allowed values for
//! enumerated properties and an optional default. Schemas are read-only
//! from the synthesis engine's point of view.

use serde::{Deserialize, Serialize};

use super::keys::is_boolean_token;
use super::value::CellValue;

/// Declared kind of a component property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Boolean,
    /// Enumerated string (variant property)
    Variant,
    /// Text, instance swap and anything else the host exposes
    Other,
}

/// Schema for a single property name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchemaEntry {
    pub name: String,
    pub kind: PropertyKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
    /// Suggested values (instance swap); not a closed set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<CellValue>,
}

impl PropertySchemaEntry {
    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Boolean,
            allowed: Vec::new(),
            preferred: Vec::new(),
            default: Some(CellValue::Bool(default)),
        }
    }

    /// Enumerated property; default is the first allowed value.
    pub fn variant(name: impl Into<String>, allowed: &[&str]) -> Self {
        let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
        let default = allowed.first().cloned().map(CellValue::Str);
        Self {
            name: name.into(),
            kind: PropertyKind::Variant,
            allowed,
            preferred: Vec::new(),
            default,
        }
    }

    pub fn other(name: impl Into<String>, default: Option<CellValue>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Other,
            allowed: Vec::new(),
            preferred: Vec::new(),
            default,
        }
    }

    pub fn with_preferred(mut self, preferred: &[&str]) -> Self {
        self.preferred = preferred.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn is_enumerated(&self) -> bool {
        self.kind == PropertyKind::Variant && !self.allowed.is_empty()
    }

    pub fn allows(&self, value: &str) -> bool {
        self.allowed.iter().any(|v| v == value)
    }

    /// Every allowed value is a boolean-like token (`Yes`/`No`, `true`/`false`, ...)
    pub fn looks_boolean(&self) -> bool {
        self.is_enumerated() && self.allowed.iter().all(|v| is_boolean_token(v))
    }
}

/// Ordered set of schema entries owned by a component or variant set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentSchema {
    entries: Vec<PropertySchemaEntry>,
}

impl ComponentSchema {
    pub fn new(entries: Vec<PropertySchemaEntry>) -> Self {
        Self { entries }
    }

    /// Lookup by property name. First declaration wins on duplicates.
    pub fn get(&self, name: &str) -> Option<&PropertySchemaEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
