//! Token constants shared by the coercer, message layer and cell naming.
//!
//! Avoid string typos, enable IDE autocomplete.

// === Sentinels ===
/// Wire token for "preserve whatever the element currently holds"
pub const KEEP_INITIAL: &str = "keep-initial";

// === Boolean-like tokens ===
/// Textual values treated as boolean-like during type inference
pub const BOOLEAN_TOKENS: &[&str] = &["Yes", "No", "True", "False", "yes", "no", "true", "false"];
/// Subset of [`BOOLEAN_TOKENS`] that coerces to `true`; everything else is `false`
pub const TRUTHY_TOKENS: &[&str] = &["true", "True", "yes", "Yes"];

// === Scene naming ===
/// Suffix of the per-candidate destination frame: `"{name} State Machine"`
pub const FRAME_SUFFIX: &str = " State Machine";

// === Cell naming ===
/// Separator between `element_property_index` segments in host cell names
pub const CELL_NAME_SEP: char = '_';

/// Is `text` one of the boolean-like tokens?
pub fn is_boolean_token(text: &str) -> bool {
    BOOLEAN_TOKENS.contains(&text)
}

/// Is `text` a truthy token?
pub fn is_truthy_token(text: &str) -> bool {
    TRUTHY_TOKENS.contains(&text)
}
