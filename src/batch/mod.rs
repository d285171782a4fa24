//! Batch model
//!
//! This module contains the material units that flow through the plant:
//!
//! - **Batch**: one truck's load of a single hybrid type and GMO class
//! - **MixedBatch**: batches of one type dried together in a dryer module
//! - **Lot**: the common view used by lines to compute processing times

pub mod batch;
pub mod mixed_batch;

pub use batch::*;
pub use mixed_batch::*;

use crate::types::{GmoClass, HybridType};

/// Anything a processing line can hold
pub trait Lot {
    /// Hybrid type of the material
    fn hybrid_type(&self) -> HybridType;

    /// GMO class of the material
    fn gmo(&self) -> GmoClass;

    /// Mass in tonnes
    fn load(&self) -> f64;
}
