//! Domain model (resource names, states, outcomes, cycle reports).
//!
//! The janitor never owns resource storage. Everything here is either a
//! value passed through the pipeline or a summary of what happened to it.

pub mod cycle;
pub mod outcome;
pub mod resource;
pub mod state;

pub use cycle::{CycleReport, CycleStop};
pub use outcome::CleanOutcome;
pub use resource::{LeaseTicket, Resource, ResourceName, ResourceType};
pub use state::ResourceState;
