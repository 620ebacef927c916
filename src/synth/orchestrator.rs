//! Interaction orchestrator.
//!
//! Sequence for one run:
//! 1. validate the request (no host access)
//! 2. discover + filter candidates, fail fast when none survive
//! 3. ensure the namespace, allocate or reuse cells
//! 4. settle: re-fetch every cell by id until visible
//! 5. bind every candidate
//! 6. find or create the destination frame
//! 7. plan and install one reaction per candidate acting as trigger
//!
//! Run-level failures (steps 1-3) abort with a [`SynthError`]; whatever was
//! already created stays in place and is reused by the next run. From step 4
//! on, failures are per element: logged, recorded in the [`RunReport`], and
//! never stop the siblings.

use log::{debug, error, info, warn};
use serde::Serialize;

use super::bindings::{install_bindings, SkipReason};
use super::cells::{allocate_cells, ensure_namespace};
use super::destination::ensure_destination_frame;
use super::discover::discover;
use super::reactions::{install_reaction, plan_reaction};
use super::settle::settle_cells;
use super::SynthError;
use crate::config::SynthConfig;
use crate::entities::{BehaviorList, NodeId, Semantics, Target};
use crate::host::Host;

/// One synthesis run, already decoded from the inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    /// Display name of the candidate instances
    pub candidate_name: String,
    /// Namespace holding the cells
    pub namespace: String,
    pub trigger: BehaviorList,
    pub others: BehaviorList,
    pub semantics: Semantics,
}

impl SynthesisRequest {
    /// Input checks that need no host access.
    pub fn validate(&self) -> Result<(), SynthError> {
        if self.trigger.is_empty() {
            return Err(SynthError::MissingBehavior);
        }
        for group in self.trigger.iter().chain(self.others.iter()) {
            if group.property_name.trim().is_empty() {
                return Err(SynthError::InvalidBehavior {
                    property: group.property_name.clone(),
                    reason: "empty property name".into(),
                });
            }
        }
        if let Some(group) = self.trigger.iter().find(|g| g.target_value == Target::KeepInitial) {
            return Err(SynthError::InvalidBehavior {
                property: group.property_name.clone(),
                reason: "trigger targets need a value".into(),
            });
        }
        Ok(())
    }
}

/// What happened to one candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ElementOutcome {
    pub node: NodeId,
    pub index: usize,
    pub bound: Vec<String>,
    pub unchanged: Vec<String>,
    pub skipped_bindings: Vec<(String, SkipReason)>,
    /// Properties whose cells never became visible
    pub unsettled: Vec<String>,
    pub reaction_actions: usize,
    pub minimal_reaction: bool,
    /// Conflicts with no resolution (write omitted)
    pub unresolved: Vec<String>,
    pub error: Option<String>,
}

impl ElementOutcome {
    pub fn is_clean(&self) -> bool {
        self.error.is_none()
            && self.unsettled.is_empty()
            && !self.minimal_reaction
            && self
                .skipped_bindings
                .iter()
                .all(|(_, r)| matches!(r, SkipReason::NoCell))
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub namespace: String,
    pub candidates: usize,
    pub excluded: Vec<NodeId>,
    pub cells_created: usize,
    pub cells_reused: usize,
    /// `"{name} State Machine"` frame on the current page
    pub destination_frame: Option<NodeId>,
    pub elements: Vec<ElementOutcome>,
}

impl RunReport {
    pub fn failed_elements(&self) -> usize {
        self.elements.iter().filter(|e| !e.is_clean()).count()
    }
}

/// Drives one synthesis run against a host.
pub struct Orchestrator<'a, H: Host + ?Sized> {
    host: &'a mut H,
    config: &'a SynthConfig,
}

impl<'a, H: Host + ?Sized> Orchestrator<'a, H> {
    pub fn new(host: &'a mut H, config: &'a SynthConfig) -> Self {
        Self { host, config }
    }

    pub fn run(&mut self, request: &SynthesisRequest) -> Result<RunReport, SynthError> {
        request.validate()?;
        info!(
            "Synthesizing {:?} interactions for {:?} in namespace {:?}",
            request.semantics, request.candidate_name, request.namespace
        );

        let discovery = discover(&*self.host, &request.candidate_name);
        if discovery.elements.is_empty() {
            return Err(SynthError::NoCandidates {
                name: request.candidate_name.clone(),
            });
        }
        let elements = discovery.elements;

        let namespace = ensure_namespace(&mut *self.host, &request.namespace)?;
        let mut cells = allocate_cells(
            &mut *self.host,
            &namespace,
            &elements,
            &request.trigger,
            &request.others,
        )?;

        let mut report = RunReport {
            namespace: request.namespace.clone(),
            candidates: elements.len(),
            excluded: discovery.excluded.into_iter().map(|(id, _)| id).collect(),
            cells_created: cells.created_count(),
            cells_reused: cells.len() - cells.created_count(),
            destination_frame: None,
            elements: elements
                .iter()
                .map(|e| ElementOutcome {
                    node: e.id.clone(),
                    index: e.index,
                    ..Default::default()
                })
                .collect(),
        };

        for key in settle_cells(&*self.host, &mut cells, self.config.settle_policy()) {
            report.elements[key.element_index].unsettled.push(key.property);
        }

        // Every binding goes in before any reaction references its cells
        for (element, outcome) in elements.iter().zip(report.elements.iter_mut()) {
            match install_bindings(&mut *self.host, element, &cells) {
                Ok(bindings) => {
                    outcome.bound = bindings.bound;
                    outcome.unchanged = bindings.unchanged;
                    outcome.skipped_bindings = bindings
                        .skipped
                        .into_iter()
                        .filter(|(_, r)| !matches!(r, SkipReason::NoCell))
                        .collect();
                }
                Err(e) => {
                    error!("Binding {} #{} failed: {}", element.name, element.index, e);
                    outcome.error = Some(e.to_string());
                }
            }
        }

        match ensure_destination_frame(&mut *self.host, &request.candidate_name) {
            Ok(frame) => report.destination_frame = Some(frame),
            Err(e) => warn!("No destination frame for {:?}: {}", request.candidate_name, e),
        }

        for (element, outcome) in elements.iter().zip(report.elements.iter_mut()) {
            if outcome.error.is_some() {
                debug!("Skipping reaction for {} #{}", element.name, element.index);
                continue;
            }
            let plan = plan_reaction(
                element,
                &cells,
                &request.trigger,
                &request.others,
                request.semantics,
                self.config.trigger,
            );
            outcome.unresolved = plan.unresolved.iter().map(|k| k.property.clone()).collect();

            match install_reaction(&mut *self.host, element, &cells, &plan, self.config.minimal_fallback) {
                Ok(installed) => {
                    outcome.reaction_actions = installed.actions;
                    outcome.minimal_reaction = installed.minimal;
                }
                Err(e) => {
                    error!("Reaction for {} #{} failed: {}", element.name, element.index, e);
                    outcome.error = Some(e.to_string());
                }
            }
        }

        let failed = report.failed_elements();
        if failed > 0 {
            warn!("{} of {} elements completed with problems", failed, report.candidates);
        }
        info!(
            "Synthesis done: {} elements, {} cells ({} new), {} excluded",
            report.candidates,
            cells.len(),
            report.cells_created,
            report.excluded.len()
        );
        Ok(report)
    }
}
