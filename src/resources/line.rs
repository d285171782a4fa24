//! Single-lot processing lines
//!
//! Unloading, sorting and shelling lines share the same shape: they hold at
//! most one lot, remember the hybrid type they last processed (to decide
//! whether a cleaning cycle is needed) and process at a fixed rate.

use std::fmt;

use serde::Serialize;

use crate::batch::Lot;
use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{GmoClass, HybridType, SortMode};

/// Specialization of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineKind {
    /// Unloading line, serves any batch
    Unload,
    /// Sorting line
    Sort {
        /// Automatic or manual
        mode: SortMode,
    },
    /// Shelling line bound to one GMO class
    Shell {
        /// The only GMO class this line accepts
        gmo: GmoClass,
    },
}

/// A processing line holding at most one lot
#[derive(Debug, Clone)]
pub struct Line<I, T> {
    id: I,
    kind: LineKind,
    rate: f64,
    current: Option<T>,
    hybrid_type: Option<HybridType>,
}

impl<I, T> Line<I, T>
where
    I: Copy + fmt::Display,
    T: Lot,
{
    /// Create an idle, never-used line
    pub fn new(id: I, kind: LineKind, rate: f64) -> Self {
        Self { id, kind, rate, current: None, hybrid_type: None }
    }

    /// Line handle
    pub fn id(&self) -> I {
        self.id
    }

    /// Line specialization
    pub fn kind(&self) -> LineKind {
        self.kind
    }

    /// Throughput in tonnes per hour
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Whether a lot is assigned
    pub fn is_occupied(&self) -> bool {
        self.current.is_some()
    }

    /// The lot currently being processed
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Hybrid type last loaded on this line, kept after release
    pub fn hybrid_type(&self) -> Option<HybridType> {
        self.hybrid_type
    }

    /// Whether processing `hybrid_type` next requires a cleaning cycle
    pub fn needs_cleaning(&self, hybrid_type: HybridType) -> bool {
        matches!(self.hybrid_type, Some(previous) if previous != hybrid_type)
    }

    /// Whether this line is allowed to take `gmo` material
    pub fn accepts(&self, gmo: GmoClass) -> bool {
        match self.kind {
            LineKind::Shell { gmo: bound } => bound == gmo,
            LineKind::Unload | LineKind::Sort { .. } => true,
        }
    }

    /// Assign a lot to this idle line
    pub fn assign(&mut self, lot: T) -> SimulationResult<()> {
        if self.current.is_some() {
            return Err(SimulationError::contract_violation(format!(
                "line {} is already occupied",
                self.id
            )));
        }
        if !self.accepts(lot.gmo()) {
            return Err(SimulationError::contract_violation(format!(
                "line {} cannot take {} material",
                self.id,
                lot.gmo()
            )));
        }

        self.hybrid_type = Some(lot.hybrid_type());
        self.current = Some(lot);
        Ok(())
    }

    /// Hours needed to process the assigned lot, excluding cleaning
    pub fn processing_time(&self) -> SimulationResult<f64> {
        let lot = self.current.as_ref().ok_or_else(|| {
            SimulationError::contract_violation(format!(
                "processing time requested for idle line {}",
                self.id
            ))
        })?;
        Ok(lot.load() / self.rate)
    }

    /// Free the line and hand back its lot
    pub fn release(&mut self) -> SimulationResult<T> {
        self.current.take().ok_or_else(|| {
            SimulationError::contract_violation(format!("line {} released while idle", self.id))
        })
    }
}
