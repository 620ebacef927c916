//! Core plumbing shared by the engine and its front ends.

pub mod event_bus;

pub use event_bus::{EventBus, downcast_event};
