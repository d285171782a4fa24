//! Simulation engine and its collaborators
//!
//! This module contains the plant event loop, the event queue, the calendar,
//! arrival and duration sources, statistics collection, and error handling.
//!
//! # Overview
//!
//! - **Plant**: owns the clock and the event queue and drives the four stages
//! - **EventQueue**: time-ordered heap with FIFO tie-breaking
//! - **Calendar**: maps the clock onto days, weekdays and operating days
//! - **ArrivalSource / DurationSource**: where trucks, loads and cleaning times come from
//! - **PlantStatistics**: counters and utilization integrals, published through a `StatisticsSink`
//! - **SimulationError**: errors raised by the engine
//!
//! # Usage Example
//!
//! ```rust
//! use grain_plant_simulator::simulation::*;
//! use grain_plant_simulator::types::*;
//!
//! let config = SimulationConfig { days: 2, seed: Some(7), ..Default::default() };
//!
//! let mut plant = Plant::from_config(config).unwrap();
//! plant.simulate().unwrap();
//!
//! let stats = plant.statistics();
//! assert!(stats.received.load >= stats.processed.load);
//! ```

pub mod calendar;
pub mod error;
pub mod event;
pub mod logging;
pub mod plant;
pub mod sources;
pub mod statistics;

// Re-export all public types for convenience
pub use calendar::*;
pub use error::*;
pub use event::*;
pub use logging::*;
pub use plant::*;
pub use sources::*;
pub use statistics::*;
