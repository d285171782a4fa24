//! Single truck load
//!
//! A `Batch` is created when a truck materializes at the plant gate and is
//! never changed afterwards.

use serde::{Deserialize, Serialize};

use crate::batch::Lot;
use crate::types::{BatchId, GmoClass, HybridType};

/// One truck's delivered load of a single hybrid type and GMO class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    id: BatchId,
    hybrid_type: HybridType,
    gmo: GmoClass,
    humidity: f64,
    load: f64,
    arrival_time: f64,
}

impl Batch {
    /// Create a new batch
    ///
    /// Negative humidity is clamped to zero.
    pub fn new(
        id: BatchId,
        hybrid_type: HybridType,
        gmo: GmoClass,
        humidity: f64,
        load: f64,
        arrival_time: f64,
    ) -> Self {
        Self { id, hybrid_type, gmo, humidity: humidity.max(0.0), load, arrival_time }
    }

    /// Unique identifier
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Initial humidity fraction
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    /// Time the truck reached the plant (hours)
    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    /// Time spent at the plant so far
    pub fn waited(&self, clock: f64) -> f64 {
        (clock - self.arrival_time).max(0.0)
    }
}

impl Lot for Batch {
    fn hybrid_type(&self) -> HybridType {
        self.hybrid_type
    }

    fn gmo(&self) -> GmoClass {
        self.gmo
    }

    fn load(&self) -> f64 {
        self.load
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_creation() {
        let batch = Batch::new(BatchId(3), HybridType(5), GmoClass::NonGmo, 0.34, 15.0, 2.5);

        assert_eq!(batch.id(), BatchId(3));
        assert_eq!(batch.hybrid_type(), HybridType(5));
        assert_eq!(batch.gmo(), GmoClass::NonGmo);
        assert_eq!(batch.humidity(), 0.34);
        assert_eq!(batch.load(), 15.0);
        assert_eq!(batch.arrival_time(), 2.5);
    }

    #[test]
    fn test_negative_humidity_is_clamped() {
        let batch = Batch::new(BatchId(1), HybridType(1), GmoClass::Gmo, -0.2, 10.0, 0.0);
        assert_eq!(batch.humidity(), 0.0);
    }

    #[test]
    fn test_waited_never_negative() {
        let batch = Batch::new(BatchId(1), HybridType(1), GmoClass::Gmo, 0.3, 10.0, 4.0);
        assert_eq!(batch.waited(10.0), 6.0);
        assert_eq!(batch.waited(1.0), 0.0);
    }
}
