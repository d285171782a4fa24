//! Core types and identifiers for the plant simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: batch ids, hybrid types and typed handles for lines, dryers and modules
//! - **Enums**: GMO class, sorting mode, module state, loss causes and output formats
//! - **Configuration**: plant parameters with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use grain_plant_simulator::types::*;
//!
//! let mut ids = BatchIdAllocator::new();
//! assert_eq!(ids.allocate(), BatchId(1));
//!
//! let config = SimulationConfig {
//!     days: 7,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! assert_eq!(config.horizon_hours(), 168.0);
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
