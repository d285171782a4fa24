//! Grain Plant Simulator
//!
//! A discrete-event simulation of a grain receiving plant: trucks arrive,
//! queue for unloading, pass through sorting, are dried in dryer modules and
//! finally shelled. Each stage has limited typed resources, so material can
//! be lost to queue timeouts or missing capacity.
//!
//! # Overview
//!
//! The simulation runs on a single time axis measured in hours. A
//! time-ordered event queue drives four coupled stages, each with its own
//! allocation policy:
//!
//! - **Unloading**: FIFO truck queue with patience timeouts; lines that last
//!   handled the same hybrid type are reused to avoid cleaning
//! - **Sorting**: automatic lines before manual ones, no buffer
//! - **Drying**: GMO-segregated dryers whose modules aggregate batches of one
//!   hybrid type and close a fixed time after their first load
//! - **Shelling**: GMO-bound lines, largest dried lot first
//!
//! ## Quick Start
//!
//! ```rust
//! use grain_plant_simulator::*;
//!
//! let config = SimulationConfig {
//!     days: 3,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut plant = Plant::from_config(config)?;
//! plant.simulate()?;
//!
//! let stats = plant.statistics();
//! println!("{}", stats.generate_compact_summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: Identifiers, enums and configuration
//! - [`batch`]: Truck batches and the mixed batches built in dryer modules
//! - [`resources`]: Processing lines, dryers and dryer modules
//! - [`stages`]: Per-stage allocation policies
//! - [`simulation`]: Event loop, calendar, sources, statistics and logging
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Types     │    │   Batch     │    │  Resources  │
//! │             │    │             │    │             │
//! │ Identifiers │◄───┤ Batch       │◄───┤ Line        │
//! │ Enums       │    │ MixedBatch  │    │ Dryer       │
//! │ Config      │    │             │    │ DryerModule │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!        ▲                   ▲                   ▲
//!        │                   │                   │
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Sources    │    │   Stages    │    │ Simulation  │
//! │             │    │             │    │             │
//! │ Arrivals    │◄───┤ Unloading   │◄───┤ Plant       │
//! │ Durations   │    │ Sorting     │    │ EventQueue  │
//! │             │    │ Drying      │    │ Statistics  │
//! │             │    │ Shelling    │    │             │
//! └─────────────┘    └─────────────┘    └─────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

// Module declarations
pub mod batch;
pub mod resources;
pub mod simulation;
pub mod stages;
pub mod types;

// Core types and identifiers
pub use types::{
    // Identifiers
    BatchId,
    ConfigValidationError,
    DryerId,
    // Enums
    GmoClass,
    HybridType,
    LossCause,
    ModuleRef,
    ModuleState,
    OutputFormat,
    ResourceClass,
    RunId,
    // Configuration
    SimulationConfig,
};

// Batches
pub use batch::{Batch, Lot, MixedBatch};

// Resources
pub use resources::{Dryer, DryerModule, Line, LineKind};

// Stage controllers
pub use stages::{DriedLot, DryingStage, FollowUp, ShellingStage, SortingStage, UnloadingStage};

// Simulation engine
pub use simulation::{
    ArrivalRecord, ArrivalSource, DurationSource, Event, EventQueue, JsonReport, Plant,
    PlantStatistics, SimulationError, SimulationResult, StatisticsSink, TextReport,
};
