//! Binding installation: rewire element properties to read from their cells.
//!
//! The property map is re-read from the host right before binding, never
//! taken from discovery-time state. A property already bound to its cell is
//! left alone, so re-running is a no-op from the element's perspective.
//! A failing bind only skips that one property.

use std::fmt;

use log::{debug, warn};
use serde::Serialize;

use crate::entities::{CellTable, CellType, Element, PropValue};
use crate::host::{HostResult, SceneHost};

/// Why a property kept its literal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NoCell,
    TypeMismatch { cell: CellType, expected: CellType },
    HostFailed { error: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoCell => f.write_str("no matching cell"),
            SkipReason::TypeMismatch { cell, expected } => {
                write!(f, "cell is {} but property needs {}", cell, expected)
            }
            SkipReason::HostFailed { error } => write!(f, "host failed: {}", error),
        }
    }
}

/// Per-element binding result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BindingOutcome {
    pub bound: Vec<String>,
    /// Already bound to the right cell, nothing sent to the host
    pub unchanged: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl BindingOutcome {
    pub fn failed(&self) -> impl Iterator<Item = &(String, SkipReason)> {
        self.skipped
            .iter()
            .filter(|(_, r)| !matches!(r, SkipReason::NoCell))
    }
}

/// Bind every property of `element` that has a cell in `cells`.
///
/// Errors only when the element's property map cannot be re-read.
pub fn install_bindings<H: SceneHost + ?Sized>(
    host: &mut H,
    element: &Element,
    cells: &CellTable,
) -> HostResult<BindingOutcome> {
    let properties = host.properties(&element.id)?;
    let mut outcome = BindingOutcome::default();

    for (property, value) in &properties {
        let Some(cell) = cells.get(element.index, property) else {
            outcome.skipped.push((property.clone(), SkipReason::NoCell));
            continue;
        };

        if cell.type_mismatch() {
            let reason = SkipReason::TypeMismatch {
                cell: cell.cell_type,
                expected: cell.expected_type,
            };
            warn!("{} #{}.{}: {}", element.name, element.index, property, reason);
            outcome.skipped.push((property.clone(), reason));
            continue;
        }

        if matches!(value, PropValue::Cell { cell: bound } if *bound == cell.id) {
            outcome.unchanged.push(property.clone());
            continue;
        }

        match host.bind_property(&element.id, property, &cell.id) {
            Ok(()) => {
                debug!("Bound {} #{}.{} -> {}", element.name, element.index, property, cell.name);
                outcome.bound.push(property.clone());
            }
            Err(e) => {
                warn!(
                    "Binding {} #{}.{} failed, keeping literal: {}",
                    element.name, element.index, property, e
                );
                outcome.skipped.push((
                    property.clone(),
                    SkipReason::HostFailed { error: e.to_string() },
                ));
            }
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BehaviorGroup, BehaviorList, CellValue, NodeId};
    use crate::host::MemoryHost;
    use crate::synth::cells::{allocate_cells, ensure_namespace};
    use crate::synth::discover::discover;

    fn prepared() -> (MemoryHost, Vec<Element>, CellTable) {
        let mut host = MemoryHost::new();
        let row = host.add_frame(None, "row", "Row");
        host.add_instance(
            Some(&row),
            "t0",
            "Tab",
            "missing",
            &[
                ("State", PropValue::Str("Idle".into())),
                ("Label", PropValue::Str("Home".into())),
            ],
        );
        host.add_instance(Some(&row), "t1", "Tab", "missing", &[("State", PropValue::Str("Active".into()))]);
        host.select(&[&row]);

        let elements = discover(&host, "Tab").elements;
        let ns = ensure_namespace(&mut host, "Tabs").unwrap();
        let trigger = BehaviorList::new(vec![BehaviorGroup::set("State", "Active")]);
        let cells = allocate_cells(&mut host, &ns, &elements, &trigger, &BehaviorList::default()).unwrap();
        (host, elements, cells)
    }

    #[test]
    fn test_binds_matching_properties_only() {
        let (mut host, elements, cells) = prepared();
        let outcome = install_bindings(&mut host, &elements[0], &cells).unwrap();
        assert_eq!(outcome.bound, vec!["State"]);
        assert_eq!(outcome.skipped, vec![("Label".to_string(), SkipReason::NoCell)]);
        assert_eq!(outcome.failed().count(), 0);

        let t0 = NodeId::from("t0");
        assert_eq!(host.effective_value(&t0, "State"), Some(CellValue::Str("Idle".into())));
        assert!(host.nodes[&t0].properties["State"].bound_cell().is_some());
        assert_eq!(host.nodes[&t0].properties["Label"], PropValue::Str("Home".into()));
    }

    #[test]
    fn test_rebinding_is_noop() {
        let (mut host, elements, cells) = prepared();
        install_bindings(&mut host, &elements[1], &cells).unwrap();
        let before = host.nodes[&NodeId::from("t1")].properties.clone();

        let again = install_bindings(&mut host, &elements[1], &cells).unwrap();
        assert!(again.bound.is_empty());
        assert_eq!(again.unchanged, vec!["State"]);
        assert_eq!(host.nodes[&NodeId::from("t1")].properties, before);
    }

    #[test]
    fn test_host_failure_skips_one_property() {
        let (mut host, elements, cells) = prepared();
        host.faults
            .binding_failures
            .insert((NodeId::from("t0"), "State".to_string()));
        let outcome = install_bindings(&mut host, &elements[0], &cells).unwrap();
        assert!(outcome.bound.is_empty());
        assert_eq!(outcome.failed().count(), 1);
        assert_eq!(
            host.nodes[&NodeId::from("t0")].properties["State"],
            PropValue::Str("Idle".into())
        );
    }

    #[test]
    fn test_type_mismatch_skipped() {
        let (mut host, elements, mut cells) = prepared();
        let key = cells.get(0, "State").unwrap().key.clone();
        cells.get_mut(&key).unwrap().cell_type = CellType::Boolean;
        let outcome = install_bindings(&mut host, &elements[0], &cells).unwrap();
        assert!(matches!(
            outcome.skipped.iter().find(|(p, _)| p == "State"),
            Some((_, SkipReason::TypeMismatch { .. }))
        ));
    }
}
