//! Reaction synthesis.
//!
//! For one trigger element, every cell in the table gets an explicit decision:
//!
//! | owner   | trigger target for p | semantics   | write                                     |
//! |---------|----------------------|-------------|-------------------------------------------|
//! | trigger | value                | any         | target value                              |
//! | trigger | none                 | any         | nothing                                   |
//! | sibling | none / keep          | any         | current value (write-back)                |
//! | sibling | value                | exclusive   | conflict ? resolution : current value     |
//! | sibling | value                | independent | others value, or current value            |
//!
//! A conflict is a sibling currently holding the value the trigger is about
//! to take. It resolves to the declared "others" value, then the schema
//! default; failing both the write is omitted and reported.
//!
//! The reaction replaces the host's whole rule set for the element, so
//! write-backs are explicit rather than no-ops.

use log::{debug, warn};

use super::coerce::coerce_target;
use crate::entities::{
    BehaviorList, CellKey, CellRecord, CellTable, CellValue, CellWrite, Element, Reaction, Semantics,
    Target, TriggerKind,
};
use crate::host::{HostResult, SceneHost};

/// Reaction computed for one trigger, with the conflicts it could not resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionPlan {
    pub reaction: Reaction,
    pub unresolved: Vec<CellKey>,
}

/// Outcome of installing a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installed {
    pub actions: usize,
    /// The full rule was refused and a single-write rule went in instead
    pub minimal: bool,
}

/// Resolve an exclusivity conflict on a sibling cell.
fn resolve_conflict(cell: &CellRecord, incoming: &CellValue, others: &BehaviorList) -> Option<CellValue> {
    if let Some(Target::Value(v)) = others.target(&cell.key.property) {
        return Some(coerce_target(cell.cell_type, v));
    }
    cell.default.clone().filter(|d| d != incoming)
}

/// Compute the write vector for `trigger`.
pub fn plan_reaction(
    trigger: &Element,
    cells: &CellTable,
    trigger_targets: &BehaviorList,
    others: &BehaviorList,
    semantics: Semantics,
    kind: TriggerKind,
) -> ReactionPlan {
    let mut reaction = Reaction::new(kind);
    let mut unresolved = Vec::new();

    for cell in cells.iter() {
        let property = cell.key.property.as_str();
        let target = trigger_targets.target(property).and_then(Target::value);

        if cell.key.element_index == trigger.index {
            if let Some(v) = target {
                reaction.push(cell.id.clone(), coerce_target(cell.cell_type, v));
            }
            continue;
        }

        let Some(v) = target else {
            // Not part of this interaction: preserve
            reaction.push(cell.id.clone(), cell.value.clone());
            continue;
        };

        let write = match semantics {
            Semantics::Exclusive => {
                let incoming = coerce_target(cell.cell_type, v);
                if cell.value == incoming {
                    let resolved = resolve_conflict(cell, &incoming, others);
                    if resolved.is_none() {
                        warn!(
                            "Trigger #{}: conflict on {} ({} = {}) has no resolution, write omitted",
                            trigger.index, cell.name, property, incoming
                        );
                        unresolved.push(cell.key.clone());
                    }
                    resolved
                } else {
                    Some(cell.value.clone())
                }
            }
            Semantics::Independent => match others.target(property) {
                Some(Target::Value(ov)) => Some(coerce_target(cell.cell_type, ov)),
                Some(Target::KeepInitial) | None => Some(cell.value.clone()),
            },
        };

        if let Some(value) = write {
            reaction.push(cell.id.clone(), value);
        }
    }

    debug!(
        "Trigger {} #{}: {} writes, {} unresolved",
        trigger.name,
        trigger.index,
        reaction.len(),
        unresolved.len()
    );
    ReactionPlan { reaction, unresolved }
}

/// Reduced rule used when the host refuses the full one: the trigger's own
/// first write, or the first write at all.
pub fn minimal_reaction(trigger: &Element, cells: &CellTable, plan: &ReactionPlan) -> Reaction {
    let own = |w: &&CellWrite| {
        cells
            .for_element(trigger.index)
            .any(|c| c.id == w.cell)
    };
    let first = plan
        .reaction
        .actions
        .iter()
        .find(own)
        .or_else(|| plan.reaction.actions.first());

    let mut reaction = Reaction::new(plan.reaction.trigger);
    if let Some(write) = first {
        reaction.push(write.cell.clone(), write.value.clone());
    }
    reaction
}

/// Install `plan` on the trigger, replacing any previous rule set.
pub fn install_reaction<H: SceneHost + ?Sized>(
    host: &mut H,
    trigger: &Element,
    cells: &CellTable,
    plan: &ReactionPlan,
    minimal_fallback: bool,
) -> HostResult<Installed> {
    match host.set_reactions(&trigger.id, vec![plan.reaction.clone()]) {
        Ok(()) => Ok(Installed {
            actions: plan.reaction.len(),
            minimal: false,
        }),
        Err(e) if minimal_fallback => {
            warn!(
                "Installing reaction on {} #{} failed ({}), retrying with a single write",
                trigger.name, trigger.index, e
            );
            let reduced = minimal_reaction(trigger, cells, plan);
            let actions = reduced.len();
            host.set_reactions(&trigger.id, vec![reduced])?;
            Ok(Installed { actions, minimal: true })
        }
        Err(e) => Err(e),
    }
}
