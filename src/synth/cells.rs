//! Cell allocation.
//!
//! One namespace per interaction, one cell per `(element index, property)`
//! touched by either behavior list and present on that element. Cells are
//! looked up by exact name before creation, so repeated runs reuse them.
//! "Others" entries declared `keep-initial` seed nothing: their value is read
//! live when reactions are computed.

use log::{debug, info, warn};

use super::SynthError;
use super::coerce::{coerce, schema_default};
use super::schema_resolver::resolve_component_schema;
use crate::entities::{
    cell_name, BehaviorList, CellKey, CellRecord, CellTable, CellValue, Element, NamespaceId,
    PropValue,
};
use crate::host::{HostResult, SceneHost, StateHost};

/// Find the namespace by name, creating it on first use.
pub fn ensure_namespace<H: StateHost + ?Sized>(host: &mut H, name: &str) -> Result<NamespaceId, SynthError> {
    let lookup = host.find_namespace(name).map_err(|source| SynthError::Namespace {
        name: name.to_string(),
        source,
    })?;
    if let Some(id) = lookup {
        debug!("Reusing namespace {} ({})", name, id);
        return Ok(id);
    }
    let id = host.create_namespace(name).map_err(|source| SynthError::Namespace {
        name: name.to_string(),
        source,
    })?;
    info!("Created namespace {} ({})", name, id);
    Ok(id)
}

/// Properties that get a cell, in declaration order, deduplicated.
pub fn declared_properties<'a>(trigger: &'a BehaviorList, others: &'a BehaviorList) -> Vec<&'a str> {
    let mut props: Vec<&str> = Vec::new();
    let from_trigger = trigger.iter().map(|g| g.property_name.as_str());
    let from_others = others
        .iter()
        .map(|g| g.property_name.as_str())
        // first declaration decides whether the entry defers
        .filter(|p| others.target(p).is_some_and(|t| !t.is_keep_initial()));
    for p in from_trigger.chain(from_others) {
        if !props.contains(&p) {
            props.push(p);
        }
    }
    props
}

/// Current literal of a property: the literal itself or the bound cell's value.
pub fn current_literal<H: StateHost + ?Sized>(host: &H, value: &PropValue) -> HostResult<Option<CellValue>> {
    match value {
        PropValue::Cell { cell } => Ok(host.cell_by_id(cell)?.map(|info| info.value)),
        literal => Ok(literal.literal()),
    }
}

/// Allocate or reuse the cells for every candidate.
///
/// Cell creation failures abort the run; cells created so far stay on the
/// host and are reused by the next attempt.
pub fn allocate_cells<H: SceneHost + StateHost + ?Sized>(
    host: &mut H,
    namespace: &NamespaceId,
    elements: &[Element],
    trigger: &BehaviorList,
    others: &BehaviorList,
) -> Result<CellTable, SynthError> {
    let properties = declared_properties(trigger, others);
    let mut table = CellTable::new();

    for element in elements {
        let schema = resolve_component_schema(&*host, &element.id);
        if schema.is_none() {
            debug!("{} #{}: no schema, inferring from values", element.name, element.index);
        }

        for property in &properties {
            let Some(value) = element.property(property) else {
                debug!("{} #{} has no property {}", element.name, element.index, property);
                continue;
            };
            let entry = schema.as_ref().and_then(|s| s.get(property));

            let raw = match current_literal(&*host, value) {
                Ok(Some(raw)) => raw,
                Ok(None) | Err(_) => match entry.and_then(|e| e.default.clone()) {
                    Some(default) => {
                        warn!(
                            "{} #{}.{}: bound cell unreadable, seeding from schema default",
                            element.name, element.index, property
                        );
                        default
                    }
                    None => {
                        warn!(
                            "{} #{}.{}: no readable value, skipping cell",
                            element.name, element.index, property
                        );
                        continue;
                    }
                },
            };

            let (expected_type, seed) = coerce(entry, &raw);
            let name = cell_name(&element.name, property, element.index);
            let key = CellKey::new(element.index, *property);
            let default = schema_default(entry, expected_type);

            let existing = host.find_cell(namespace, &name).map_err(|source| SynthError::Allocation {
                name: name.clone(),
                source,
            })?;

            let record = match existing {
                Some(info) => {
                    if info.cell_type != expected_type {
                        warn!(
                            "Cell {} is {} but property resolves to {}",
                            name, info.cell_type, expected_type
                        );
                    }
                    debug!("Reusing cell {} = {}", name, info.value);
                    CellRecord {
                        key,
                        id: info.id,
                        name,
                        cell_type: info.cell_type,
                        expected_type,
                        value: info.value,
                        default,
                        created: false,
                    }
                }
                None => {
                    let id = host
                        .create_cell(namespace, &name, expected_type, seed.clone())
                        .map_err(|source| SynthError::Allocation {
                            name: name.clone(),
                            source,
                        })?;
                    debug!("Created cell {} = {}", name, seed);
                    CellRecord {
                        key,
                        id,
                        name,
                        cell_type: expected_type,
                        expected_type,
                        value: seed,
                        default,
                        created: true,
                    }
                }
            };
            table.insert(record);
        }
    }

    info!(
        "Allocated {} cells ({} new, {} reused)",
        table.len(),
        table.created_count(),
        table.len() - table.created_count()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BehaviorGroup, CellType, ComponentSchema, PropertySchemaEntry};
    use crate::host::MemoryHost;
    use crate::synth::discover::discover;

    fn scene() -> MemoryHost {
        let mut host = MemoryHost::new();
        host.add_component(
            "set",
            "Tab",
            None,
            ComponentSchema::new(vec![
                PropertySchemaEntry::variant("State", &["Idle", "Active"]),
                PropertySchemaEntry::boolean("Badge", false),
            ]),
        );
        host.add_component("v", "State=Idle", Some("set"), ComponentSchema::default());
        let row = host.add_frame(None, "row", "Row");
        host.add_instance(
            Some(&row),
            "t0",
            "Tab",
            "v",
            &[("State", PropValue::Str("Idle".into())), ("Badge", PropValue::Bool(true))],
        );
        // Heterogeneous: no Badge here
        host.add_instance(Some(&row), "t1", "Tab", "v", &[("State", PropValue::Str("Active".into()))]);
        host.select(&[&row]);
        host
    }

    #[test]
    fn test_declared_properties() {
        let trigger = BehaviorList::new(vec![BehaviorGroup::set("State", "Active")]);
        let others = BehaviorList::new(vec![
            BehaviorGroup::keep("Badge"),
            BehaviorGroup::set("State", "Idle"),
            BehaviorGroup::set("Size", "Small"),
            BehaviorGroup::set("Badge", "true"),
        ]);
        assert_eq!(declared_properties(&trigger, &others), vec!["State", "Size"]);
    }

    #[test]
    fn test_allocates_per_present_property() {
        let mut host = scene();
        let elements = discover(&host, "Tab").elements;
        let ns = ensure_namespace(&mut host, "Tabs").unwrap();
        let trigger = BehaviorList::new(vec![
            BehaviorGroup::set("State", "Active"),
            BehaviorGroup::set("Badge", "false"),
        ]);
        let table = allocate_cells(&mut host, &ns, &elements, &trigger, &BehaviorList::default()).unwrap();

        assert_eq!(table.len(), 3);
        let state0 = table.get(0, "State").unwrap();
        assert_eq!(state0.name, "Tab_State_0");
        assert_eq!(state0.cell_type, CellType::String);
        assert_eq!(state0.default, Some(CellValue::Str("Idle".into())));
        assert_eq!(table.get(1, "State").unwrap().value, CellValue::Str("Active".into()));
        assert_eq!(table.get(0, "Badge").unwrap().value, CellValue::Bool(true));
        assert!(table.get(1, "Badge").is_none());
    }

    #[test]
    fn test_reuses_cells_by_name() {
        let mut host = scene();
        let elements = discover(&host, "Tab").elements;
        let trigger = BehaviorList::new(vec![BehaviorGroup::set("State", "Active")]);

        let ns = ensure_namespace(&mut host, "Tabs").unwrap();
        let first = allocate_cells(&mut host, &ns, &elements, &trigger, &BehaviorList::default()).unwrap();
        let ns_again = ensure_namespace(&mut host, "Tabs").unwrap();
        assert_eq!(ns, ns_again);
        let second = allocate_cells(&mut host, &ns, &elements, &trigger, &BehaviorList::default()).unwrap();

        assert_eq!(second.created_count(), 0);
        assert_eq!(host.cells.len(), 2);
        let ids1: Vec<_> = first.iter().map(|c| c.id.clone()).collect();
        let ids2: Vec<_> = second.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids1, ids2);
    }

    #[test]
    fn test_keep_initial_others_seed_nothing() {
        let mut host = scene();
        let elements = discover(&host, "Tab").elements;
        let ns = ensure_namespace(&mut host, "Tabs").unwrap();
        let trigger = BehaviorList::new(vec![BehaviorGroup::set("State", "Active")]);
        let others = BehaviorList::new(vec![BehaviorGroup::keep("Badge")]);
        let table = allocate_cells(&mut host, &ns, &elements, &trigger, &others).unwrap();
        assert!(table.iter().all(|c| c.key.property == "State"));
    }
}
