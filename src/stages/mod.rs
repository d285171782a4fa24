//! Stage controllers
//!
//! Each stage owns its resource pool and allocation policy. Stage operations
//! never touch the event queue; they return the follow-up events the plant
//! has to schedule.
//!
//! - **UnloadingStage**: truck queue with patience timeouts and affinity reuse
//! - **SortingStage**: automatic and manual lines with no buffer
//! - **DryingStage**: GMO-restricted dryers with time-based module closure
//! - **ShellingStage**: GMO-bound lines fed largest lot first

pub mod drying;
pub mod shelling;
pub mod sorting;
pub mod unloading;

pub use drying::*;
pub use shelling::*;
pub use sorting::*;
pub use unloading::*;

use crate::simulation::Event;

/// An event a stage wants scheduled
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUp {
    /// Dispatch time (hours)
    pub time: f64,
    /// The event
    pub event: Event,
}

impl FollowUp {
    /// Create a follow-up event
    pub fn new(time: f64, event: Event) -> Self {
        Self { time, event }
    }
}
