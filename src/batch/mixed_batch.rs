//! Aggregation of batches dried together in one module

use serde::{Deserialize, Serialize};

use crate::batch::{Batch, Lot};
use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{BatchId, GmoClass, HybridType};

/// Batches of one hybrid type and GMO class accumulated in a dryer module
///
/// Always holds at least one batch: it can only be started from a first batch
/// or built from a non-empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedBatch {
    hybrid_type: HybridType,
    gmo: GmoClass,
    batches: Vec<Batch>,
    load: f64,
    humidity: f64,
}

impl MixedBatch {
    /// Start a mixed batch from its first component
    pub fn new(first: Batch) -> Self {
        Self {
            hybrid_type: first.hybrid_type(),
            gmo: first.gmo(),
            load: first.load(),
            humidity: first.humidity(),
            batches: vec![first],
        }
    }

    /// Build a mixed batch from a list of batches
    pub fn from_batches(batches: Vec<Batch>) -> SimulationResult<Self> {
        let mut iter = batches.into_iter();
        let first = iter.next().ok_or_else(|| {
            SimulationError::contract_violation("cannot build a mixed batch from no batches")
        })?;

        let mut mixed = Self::new(first);
        for batch in iter {
            mixed.push(batch)?;
        }
        Ok(mixed)
    }

    /// Add a batch of the same hybrid type and GMO class
    pub fn push(&mut self, batch: Batch) -> SimulationResult<()> {
        if batch.hybrid_type() != self.hybrid_type || batch.gmo() != self.gmo {
            return Err(SimulationError::contract_violation(format!(
                "{} ({}, {}) cannot join a mixed batch of {} ({})",
                batch.id(),
                batch.hybrid_type(),
                batch.gmo(),
                self.hybrid_type,
                self.gmo
            )));
        }

        let total = self.load + batch.load();
        if total > 0.0 {
            self.humidity = (self.humidity * self.load + batch.humidity() * batch.load()) / total;
        }
        self.load = total;
        self.batches.push(batch);
        Ok(())
    }

    /// Load-weighted average humidity of the components
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    /// Components in load order
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Component ids in load order
    pub fn batch_ids(&self) -> impl Iterator<Item = BatchId> + '_ {
        self.batches.iter().map(Batch::id)
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether the batch holds no truck loads
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Earliest arrival time among the components
    pub fn earliest_arrival(&self) -> f64 {
        self.batches.iter().map(Batch::arrival_time).fold(f64::INFINITY, f64::min)
    }

    /// Total hours spent in the plant by every component, measured at `clock`
    pub fn total_dwell(&self, clock: f64) -> f64 {
        self.batches.iter().map(|batch| batch.waited(clock)).sum()
    }
}

impl Lot for MixedBatch {
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
