//! Type/value coercion: raw property value + optional schema -> canonical cell literal.
//!
//! Rules, in order:
//! 1. boolean-kind schema -> `BOOLEAN`
//! 2. enumerated schema -> `STRING`, always (boolean-looking enums are not demoted)
//! 3. no usable schema and a boolean-like raw value -> `BOOLEAN`
//! 4. otherwise `STRING`

use log::{debug, warn};

use crate::entities::keys::{is_boolean_token, is_truthy_token};
use crate::entities::{CellType, CellValue, PropertyKind, PropertySchemaEntry};

/// Canonical cell type for a property.
pub fn canonical_type(schema: Option<&PropertySchemaEntry>, raw: &CellValue) -> CellType {
    match schema {
        Some(entry) if entry.kind == PropertyKind::Boolean => CellType::Boolean,
        Some(entry) if entry.is_enumerated() => CellType::String,
        _ => match raw {
            CellValue::Bool(_) => CellType::Boolean,
            CellValue::Str(s) if is_boolean_token(s) => CellType::Boolean,
            CellValue::Str(_) => CellType::String,
        },
    }
}

/// `{true, True, yes, Yes}` -> true, anything else -> false.
pub fn to_bool(text: &str) -> bool {
    is_truthy_token(text)
}

/// Convert `raw` into a literal of `cell_type`.
pub fn coerce_to(cell_type: CellType, raw: &CellValue) -> CellValue {
    match (cell_type, raw) {
        (CellType::Boolean, CellValue::Bool(b)) => CellValue::Bool(*b),
        (CellType::Boolean, CellValue::Str(s)) => CellValue::Bool(to_bool(s)),
        (CellType::String, v) => CellValue::Str(v.as_text()),
    }
}

/// Canonical type plus the literal a new cell is seeded with.
///
/// An enumerated value outside the allowed set is replaced by the first
/// allowed value.
pub fn coerce(schema: Option<&PropertySchemaEntry>, raw: &CellValue) -> (CellType, CellValue) {
    let cell_type = canonical_type(schema, raw);
    let mut value = coerce_to(cell_type, raw);

    if let Some(entry) = schema.filter(|e| e.is_enumerated()) {
        if entry.looks_boolean() {
            debug!("{}: boolean-like enum {:?} kept as STRING", entry.name, entry.allowed);
        }
        let text = value.as_text();
        if !entry.allows(&text) {
            let fallback = entry.allowed[0].clone();
            warn!(
                "{}: value {:?} not in {:?}, using {:?}",
                entry.name, text, entry.allowed, fallback
            );
            value = CellValue::Str(fallback);
        }
    }
    (cell_type, value)
}

/// Literal for a declared target value, shaped for a cell of `cell_type`.
pub fn coerce_target(cell_type: CellType, target: &str) -> CellValue {
    coerce_to(cell_type, &CellValue::Str(target.to_string()))
}

/// Reset value the schema offers for `cell_type`, in order: first allowed
/// variant, first preferred value, `false` for boolean properties, then the
/// declared default.
///
/// Boolean kind ranks above the declared default so a property defaulting to
/// `true` can still be moved off a `true` trigger.
pub fn schema_default(schema: Option<&PropertySchemaEntry>, cell_type: CellType) -> Option<CellValue> {
    let entry = schema?;
    let default = entry
        .allowed
        .first()
        .or_else(|| entry.preferred.first())
        .map(|v| CellValue::Str(v.clone()))
        .or_else(|| (entry.kind == PropertyKind::Boolean).then_some(CellValue::Bool(false)))
        .or_else(|| entry.default.clone());
    if default.is_none() {
        debug!("{}: schema declares no default", entry.name);
    }
    default.map(|d| coerce_to(cell_type, &d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_kind() {
        let entry = PropertySchemaEntry::boolean("Visible", true);
        assert_eq!(canonical_type(Some(&entry), &CellValue::Str("Shown".into())), CellType::Boolean);
        let (t, v) = coerce(Some(&entry), &CellValue::Bool(false));
        assert_eq!((t, v), (CellType::Boolean, CellValue::Bool(false)));
    }

    #[test]
    fn test_boolean_like_enum_stays_string() {
        let entry = PropertySchemaEntry::variant("Checked", &["Yes", "No"]);
        let (t, v) = coerce(Some(&entry), &CellValue::Str("Yes".into()));
        assert_eq!(t, CellType::String);
        assert_eq!(v, CellValue::Str("Yes".into()));
    }

    #[test]
    fn test_schema_less_inference() {
        assert_eq!(canonical_type(None, &CellValue::Str("true".into())), CellType::Boolean);
        assert_eq!(canonical_type(None, &CellValue::Bool(true)), CellType::Boolean);
        assert_eq!(canonical_type(None, &CellValue::Str("Large".into())), CellType::String);

        let other = PropertySchemaEntry::other("Label", None);
        assert_eq!(canonical_type(Some(&other), &CellValue::Str("no".into())), CellType::Boolean);
    }

    #[test]
    fn test_bool_tokens() {
        assert!(to_bool("Yes"));
        assert!(to_bool("true"));
        assert!(!to_bool("No"));
        assert!(!to_bool("TRUE"));
        assert_eq!(coerce_target(CellType::Boolean, "yes"), CellValue::Bool(true));
        assert_eq!(coerce_target(CellType::String, "Active"), CellValue::Str("Active".into()));
    }

    #[test]
    fn test_out_of_set_enum_uses_first_allowed() {
        let entry = PropertySchemaEntry::variant("State", &["Idle", "Active"]);
        let (_, v) = coerce(Some(&entry), &CellValue::Str("Hover".into()));
        assert_eq!(v, CellValue::Str("Idle".into()));
    }

    #[test]
    fn test_schema_default() {
        let entry = PropertySchemaEntry::variant("State", &["Idle", "Active"]);
        assert_eq!(schema_default(Some(&entry), CellType::String), Some(CellValue::Str("Idle".into())));
        let flag = PropertySchemaEntry::boolean("On", false);
        assert_eq!(schema_default(Some(&flag), CellType::Boolean), Some(CellValue::Bool(false)));
        assert_eq!(schema_default(None, CellType::String), None);
        assert_eq!(schema_default(Some(&PropertySchemaEntry::other("Label", None)), CellType::String), None);
    }

    #[test]
    fn test_schema_default_order() {
        // Declared default never outranks the first variant option
        let mut entry = PropertySchemaEntry::variant("State", &["Idle", "Active"]);
        entry.default = Some(CellValue::Str("Active".into()));
        assert_eq!(schema_default(Some(&entry), CellType::String), Some(CellValue::Str("Idle".into())));

        let on = PropertySchemaEntry::boolean("Selected", true);
        assert_eq!(schema_default(Some(&on), CellType::Boolean), Some(CellValue::Bool(false)));

        let swap = PropertySchemaEntry::other("Icon", Some(CellValue::Str("star".into()))).with_preferred(&["dot", "star"]);
        assert_eq!(schema_default(Some(&swap), CellType::String), Some(CellValue::Str("dot".into())));

        let label = PropertySchemaEntry::other("Label", Some(CellValue::Str("Home".into())));
        assert_eq!(schema_default(Some(&label), CellType::String), Some(CellValue::Str("Home".into())));
    }
}
