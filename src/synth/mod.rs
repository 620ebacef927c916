//! Interaction synthesis engine.
//!
//! Compiles a declarative behavior request into host primitives:
//! discover candidates -> allocate cells -> settle -> bind -> install reactions.
//!
//! Leaves first:
//! - `schema_resolver`: authoritative schema entry for a property
//! - `coerce`: canonical cell type and literal for a raw value
//! - `discover`: candidate instances in the selection subtree
//! - `cells`: namespace + one cell per (element index, property)
//! - `settle`: re-fetch cells by id until the host reports them
//! - `bindings`: rewire element properties to read from cells
//! - `destination`: per-candidate `"{name} State Machine"` frame
//! - `reactions`: per-trigger write vectors honoring exclusivity
//! - `orchestrator`: sequencing and the run report

pub mod bindings;
pub mod cells;
pub mod coerce;
pub mod destination;
pub mod discover;
pub mod orchestrator;
pub mod reactions;
pub mod schema_resolver;
pub mod settle;

pub use orchestrator::{ElementOutcome, Orchestrator, RunReport, SynthesisRequest};

use thiserror::Error;

use crate::host::HostError;

/// Run-level failure. Element-level failures never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    #[error("No valid instances found with name: {name} in the current selection context")]
    NoCandidates { name: String },
    #[error("No trigger behavior declared")]
    MissingBehavior,
    #[error("Invalid behavior for {property}: {reason}")]
    InvalidBehavior { property: String, reason: String },
    #[error("Namespace {name} unavailable: {source}")]
    Namespace {
        name: String,
        #[source]
        source: HostError,
    },
    #[error("Cell {name} could not be allocated: {source}")]
    Allocation {
        name: String,
        #[source]
        source: HostError,
    },
}
