//! Shelling stage
//!
//! Dried lots wait in a ready pool and are shelled largest first. Each line is
//! bound to one GMO class, so the largest lot whose class has a free line is
//! the one started.

use tracing::debug;

use crate::batch::Lot;
use crate::resources::{Line, LineKind};
use crate::simulation::{DurationSource, Event, SimulationError, SimulationResult};
use crate::stages::{DriedLot, FollowUp};
use crate::types::{ModuleRef, ShellLineId, SimulationConfig};

/// Shelling line
pub type ShellLine = Line<ShellLineId, DriedLot>;

/// Outcome of starting a shelling job
#[derive(Debug, Clone, PartialEq)]
pub struct ShellStarted {
    /// Line assigned
    pub line: ShellLineId,
    /// Module the lot came from
    pub module: ModuleRef,
    /// Cleaning time included in the job
    pub cleaning: f64,
    /// The `shelling_finished` event
    pub follow_up: FollowUp,
}

#[derive(Debug)]
struct ReadyLot {
    lot: DriedLot,
    sequence: u64,
}

/// Ready pool and shelling lines
#[derive(Debug)]
pub struct ShellingStage {
    lines: Vec<ShellLine>,
    ready: Vec<ReadyLot>,
    next_sequence: u64,
}

impl ShellingStage {
    /// Build the GMO-bound lines from the configuration
    pub fn new(config: &SimulationConfig) -> Self {
        let lines = config
            .shelling
            .lines
            .iter()
            .enumerate()
            .map(|(index, gmo)| {
                Line::new(ShellLineId(index), LineKind::Shell { gmo: *gmo }, config.shelling.rate)
            })
            .collect();
        Self { lines, ready: Vec::new(), next_sequence: 0 }
    }

    /// Lines in index order
    pub fn lines(&self) -> &[ShellLine] {
        &self.lines
    }

    /// Number of occupied lines
    pub fn busy_lines(&self) -> usize {
        self.lines.iter().filter(|line| line.is_occupied()).count()
    }

    /// Number of lots waiting for a line
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Tonnes waiting or being shelled
    pub fn load_in_stage(&self) -> f64 {
        let waiting: f64 = self.ready.iter().map(|ready| ready.lot.load()).sum();
        let shelling: f64 = self.lines.iter().filter_map(|line| line.current()).map(Lot::load).sum();
        waiting + shelling
    }

    /// Add a dried lot to the ready pool
    pub fn push_ready(&mut self, lot: DriedLot) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.ready.push(ReadyLot { lot, sequence });
    }

    fn free_line_for(&self, lot: &DriedLot) -> Option<usize> {
        self.lines.iter().position(|line| !line.is_occupied() && line.accepts(lot.gmo()))
    }

    /// Start the largest ready lot that has a free line of its GMO class
    pub fn start_next(
        &mut self,
        clock: f64,
        durations: &mut dyn DurationSource,
    ) -> SimulationResult<Option<ShellStarted>> {
        let chosen = self
            .ready
            .iter()
            .enumerate()
            .filter(|(_, ready)| self.free_line_for(&ready.lot).is_some())
            .max_by(|(_, a), (_, b)| {
                a.lot.load().total_cmp(&b.lot.load()).then_with(|| b.sequence.cmp(&a.sequence))
            })
            .map(|(position, _)| position);

        let Some(position) = chosen else {
            return Ok(None);
        };
        let lot = self.ready.remove(position).lot;
        let index = self.free_line_for(&lot).ok_or_else(|| {
            SimulationError::contract_violation(format!("no free shelling line for {}", lot.module))
        })?;

        let line = &mut self.lines[index];
        let cleaning = if line.needs_cleaning(lot.hybrid_type()) {
            durations.shelling_cleaning_time()
        } else {
            0.0
        };
        let module = lot.module;
        line.assign(lot)?;
        let finish = clock + line.processing_time()? + cleaning;
        let line_id = line.id();

        debug!(module = %module, line = %line_id, cleaning, finish, "Shelling started");
        Ok(Some(ShellStarted {
            line: line_id,
            module,
            cleaning,
            follow_up: FollowUp::new(
                finish,
                Event::ShellingFinished { line: line_id, module, cleaning },
            ),
        }))
    }

    /// Free the line and return the shelled lot
    pub fn finish(&mut self, line: ShellLineId) -> SimulationResult<DriedLot> {
        self.lines
            .get_mut(line.index())
            .ok_or_else(|| SimulationError::contract_violation(format!("unknown shelling line {}", line)))?
            .release()
    }
}
