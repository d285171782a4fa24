//! Unloading stage
//!
//! Trucks wait in a FIFO queue for one of the unloading lines. Any line may
//! serve any batch. A free line that last unloaded the same hybrid type is
//! preferred because it needs no cleaning, unless the head of the queue has
//! already waited past the starvation threshold.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::batch::{Batch, Lot};
use crate::resources::{Line, LineKind};
use crate::simulation::{DurationSource, Event, SimulationError, SimulationResult};
use crate::stages::FollowUp;
use crate::types::{BatchId, HybridType, SimulationConfig, UnloadLineId};

/// Unloading line
pub type UnloadLine = Line<UnloadLineId, Batch>;

/// Outcome of starting an unload job
#[derive(Debug, Clone, PartialEq)]
pub struct UnloadStarted {
    /// Batch taken from the queue
    pub batch: BatchId,
    /// Line assigned
    pub line: UnloadLineId,
    /// Hours the batch spent in the queue
    pub queue_wait: f64,
    /// Cleaning time included in the job
    pub cleaning: f64,
    /// The `unload_finished` event
    pub follow_up: FollowUp,
}

/// Truck queue and unloading lines
#[derive(Debug)]
pub struct UnloadingStage {
    queue: VecDeque<Batch>,
    lines: Vec<UnloadLine>,
    patience: f64,
    starvation_threshold: f64,
    // Batches that left the queue for a line and still have a pending timeout
    unloaded: HashSet<BatchId>,
}

impl UnloadingStage {
    /// Build the line pool from the configuration
    pub fn new(config: &SimulationConfig) -> Self {
        let unloading = &config.unloading;
        let lines = (0..unloading.line_count)
            .map(|index| Line::new(UnloadLineId(index), LineKind::Unload, unloading.rate))
            .collect();
        Self {
            queue: VecDeque::new(),
            lines,
            patience: unloading.patience_hours,
            starvation_threshold: unloading.starvation_threshold_hours(),
            unloaded: HashSet::new(),
        }
    }

    /// Maximum time a batch may wait in the queue
    pub fn patience(&self) -> f64 {
        self.patience
    }

    /// Queued batches, head first
    pub fn queue(&self) -> impl Iterator<Item = &Batch> {
        self.queue.iter()
    }

    /// Number of queued batches
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Lines in index order
    pub fn lines(&self) -> &[UnloadLine] {
        &self.lines
    }

    /// Number of occupied lines
    pub fn busy_lines(&self) -> usize {
        self.lines.iter().filter(|line| line.is_occupied()).count()
    }

    /// Whether any line is free
    pub fn has_free_line(&self) -> bool {
        self.lines.iter().any(|line| !line.is_occupied())
    }

    /// Tonnes queued or being unloaded
    pub fn load_in_stage(&self) -> f64 {
        let queued: f64 = self.queue.iter().map(Lot::load).sum();
        let unloading: f64 = self.lines.iter().filter_map(|line| line.current()).map(Lot::load).sum();
        queued + unloading
    }

    /// Append a batch to the queue
    pub fn enqueue(&mut self, batch: Batch) {
        self.queue.push_back(batch);
    }

    /// Free lines keyed by the hybrid type they last unloaded (lowest index wins)
    pub fn free_lines_by_type(&self) -> HashMap<HybridType, UnloadLineId> {
        let mut map = HashMap::new();
        for line in self.lines.iter().filter(|line| !line.is_occupied()) {
            if let Some(hybrid_type) = line.hybrid_type() {
                map.entry(hybrid_type).or_insert(line.id());
            }
        }
        map
    }

    /// Take the next batch to unload and, when affinity applies, its line
    pub fn select_next(&mut self, clock: f64) -> SimulationResult<(Batch, Option<UnloadLineId>)> {
        let head_wait = self
            .queue
            .front()
            .map(|batch| batch.waited(clock))
            .ok_or_else(|| SimulationError::contract_violation("select_next on an empty unloading queue"))?;

        if head_wait <= self.starvation_threshold {
            let by_type = self.free_lines_by_type();
            let matched = self.queue.iter().enumerate().find_map(|(position, batch)| {
                by_type.get(&batch.hybrid_type()).map(|line| (position, *line))
            });
            if let Some((position, line)) = matched {
                if let Some(batch) = self.queue.remove(position) {
                    return Ok((batch, Some(line)));
                }
            }
        }

        let batch = self
            .queue
            .pop_front()
            .ok_or_else(|| SimulationError::contract_violation("unloading queue emptied during selection"))?;
        Ok((batch, None))
    }

    /// Start unloading the next batch if the queue is non-empty and a line is free
    pub fn start_unload(
        &mut self,
        clock: f64,
        durations: &mut dyn DurationSource,
    ) -> SimulationResult<Option<UnloadStarted>> {
        if self.queue.is_empty() || !self.has_free_line() {
            return Ok(None);
        }

        let (batch, preferred) = self.select_next(clock)?;
        let line_id = match preferred {
            Some(line) => line,
            None => self
                .lines
                .iter()
                .find(|line| !line.is_occupied())
                .map(|line| line.id())
                .ok_or_else(|| SimulationError::contract_violation("no free unloading line"))?,
        };

        let line = self.line_mut(line_id)?;
        let cleaning = if line.needs_cleaning(batch.hybrid_type()) {
            durations.unload_cleaning_time()
        } else {
            0.0
        };
        let batch_id = batch.id();
        let queue_wait = batch.waited(clock);
        line.assign(batch)?;
        let finish = clock + line.processing_time()? + cleaning;
        self.unloaded.insert(batch_id);

        debug!(batch = %batch_id, line = %line_id, queue_wait, cleaning, finish, "Unload started");
        Ok(Some(UnloadStarted {
            batch: batch_id,
            line: line_id,
            queue_wait,
            cleaning,
            follow_up: FollowUp::new(
                finish,
                Event::UnloadFinished { batch: batch_id, line: line_id, cleaning },
            ),
        }))
    }

    /// Free the line and hand the batch to sorting at the same instant
    pub fn finish_unload(
        &mut self,
        line: UnloadLineId,
        batch: BatchId,
        clock: f64,
    ) -> SimulationResult<FollowUp> {
        let released = self.line_mut(line)?.release()?;
        if released.id() != batch {
            return Err(SimulationError::contract_violation(format!(
                "line {} finished {} but was unloading {}",
                line,
                batch,
                released.id()
            )));
        }
        Ok(FollowUp::new(clock, Event::SortingReady { batch: released }))
    }

    /// Evict a batch whose patience ran out
    ///
    /// Returns `None` when the batch already left the queue for a line.
    pub fn expire(&mut self, batch: BatchId) -> SimulationResult<Option<Batch>> {
        if self.unloaded.remove(&batch) {
            return Ok(None);
        }
        let position = self.queue.iter().position(|queued| queued.id() == batch).ok_or_else(|| {
            SimulationError::contract_violation(format!("{} timed out but is not queued", batch))
        })?;
        Ok(self.queue.remove(position))
    }

    fn line_mut(&mut self, id: UnloadLineId) -> SimulationResult<&mut UnloadLine> {
        self.lines.get_mut(id.index()).ok_or_else(|| {
            SimulationError::contract_violation(format!("unknown unloading line {}", id))
        })
    }
}
