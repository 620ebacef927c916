//! WIRESTATE - interaction synthesis for component-based design scenes
//!
//! Re-exports all modules for use by the binary target.

// Core plumbing (events)
pub mod core;

// Domain model and host boundary
pub mod entities;
pub mod host;
pub mod synth;

// App modules
pub mod cli;
pub mod config;
pub mod paths;
pub mod plugin;

// Re-export commonly used types
pub use config::SynthConfig;
pub use core::event_bus::{BoxedEvent, EventBus, downcast_event};
pub use host::{Host, HostError, MemoryHost, SceneHost, StateHost};
pub use plugin::{ControlMessage, Plugin, ResultMessage};
pub use synth::{Orchestrator, RunReport, SynthError, SynthesisRequest};
