//! Declared behaviors: which property goes to which value when an element fires.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::keys::KEEP_INITIAL;

/// Target of a behavior group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Assign this value (textual form; coerced per cell type)
    Value(String),
    /// Preserve whatever the element currently holds
    KeepInitial,
}

impl Target {
    pub fn value(&self) -> Option<&str> {
        match self {
            Target::Value(v) => Some(v),
            Target::KeepInitial => None,
        }
    }

    pub fn is_keep_initial(&self) -> bool {
        matches!(self, Target::KeepInitial)
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Target::Value(v) => serializer.serialize_str(v),
            Target::KeepInitial => serializer.serialize_str(KEEP_INITIAL),
        }
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // UI may send booleans for boolean properties
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Str(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Target::Value(b.to_string()),
            Raw::Str(s) if s == KEEP_INITIAL => Target::KeepInitial,
            Raw::Str(s) => Target::Value(s),
        })
    }
}

/// One `(property, target)` pair declared by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorGroup {
    pub property_name: String,
    pub target_value: Target,
}

impl BehaviorGroup {
    pub fn set(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property_name: property.into(),
            target_value: Target::Value(value.into()),
        }
    }

    pub fn keep(property: impl Into<String>) -> Self {
        Self {
            property_name: property.into(),
            target_value: Target::KeepInitial,
        }
    }
}

/// Ordered list of behavior groups. Lookups return the first declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BehaviorList(Vec<BehaviorGroup>);

impl BehaviorList {
    pub fn new(groups: Vec<BehaviorGroup>) -> Self {
        Self(groups)
    }

    pub fn find(&self, property: &str) -> Option<&BehaviorGroup> {
        self.0.iter().find(|g| g.property_name == property)
    }

    /// Declared target for `property`, first match wins.
    pub fn target(&self, property: &str) -> Option<&Target> {
        self.find(property).map(|g| &g.target_value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BehaviorGroup> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<BehaviorGroup>> for BehaviorList {
    fn from(groups: Vec<BehaviorGroup>) -> Self {
        Self(groups)
    }
}

/// Exclusivity policy of a synthesis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Semantics {
    /// Radio: siblings are moved away from the trigger's new value
    Exclusive,
    /// Siblings take the declared "others" value unconditionally
    Independent,
}

impl Semantics {
    pub fn from_exclusive(exclusive: bool) -> Self {
        if exclusive { Semantics::Exclusive } else { Semantics::Independent }
    }

    pub fn is_exclusive(self) -> bool {
        self == Semantics::Exclusive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_wire_format() {
        let groups: Vec<BehaviorGroup> = serde_json::from_str(
            r#"[{"propertyName":"State","targetValue":"keep-initial"},
                {"propertyName":"Checked","targetValue":true},
                {"propertyName":"Size","targetValue":"Large"}]"#,
        )
        .unwrap();
        assert_eq!(groups[0].target_value, Target::KeepInitial);
        assert_eq!(groups[1].target_value, Target::Value("true".into()));
        assert_eq!(groups[2].target_value.value(), Some("Large"));

        let json = serde_json::to_string(&BehaviorGroup::keep("State")).unwrap();
        assert!(json.contains("\"keep-initial\""));
    }

    #[test]
    fn test_first_declaration_wins() {
        let list = BehaviorList::new(vec![
            BehaviorGroup::set("State", "Active"),
            BehaviorGroup::set("State", "Idle"),
        ]);
        assert_eq!(list.target("State"), Some(&Target::Value("Active".into())));
        assert!(list.target("Size").is_none());
    }
}
