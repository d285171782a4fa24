//! Sorting stage
//!
//! Automatic lines come first in index order, so they are always preferred
//! over manual ones. There is no buffer: a batch that finds every line busy is
//! lost by the caller.

use tracing::debug;

use crate::batch::{Batch, Lot};
use crate::resources::{Line, LineKind};
use crate::simulation::{Event, SimulationError, SimulationResult};
use crate::stages::FollowUp;
use crate::types::{BatchId, SimulationConfig, SortLineId, SortMode};

/// Sorting line
pub type SortLine = Line<SortLineId, Batch>;

/// Outcome of starting a sort job
#[derive(Debug, Clone, PartialEq)]
pub struct SortStarted {
    /// Line assigned
    pub line: SortLineId,
    /// The `sorting_finished` event
    pub follow_up: FollowUp,
}

/// Pool of sorting lines
#[derive(Debug)]
pub struct SortingStage {
    lines: Vec<SortLine>,
}

impl SortingStage {
    /// Build the automatic and manual lines from the configuration
    pub fn new(config: &SimulationConfig) -> Self {
        let sorting = &config.sorting;
        let automatic =
            (0..sorting.automatic_lines).map(|_| (SortMode::Automatic, sorting.automatic_rate));
        let manual = (0..sorting.manual_lines).map(|_| (SortMode::Manual, sorting.manual_rate));

        let lines = automatic
            .chain(manual)
            .enumerate()
            .map(|(index, (mode, rate))| Line::new(SortLineId(index), LineKind::Sort { mode }, rate))
            .collect();
        Self { lines }
    }

    /// Lines in index order
    pub fn lines(&self) -> &[SortLine] {
        &self.lines
    }

    /// Number of occupied lines
    pub fn busy_lines(&self) -> usize {
        self.lines.iter().filter(|line| line.is_occupied()).count()
    }

    /// Number of idle lines
    pub fn free_lines(&self) -> usize {
        self.lines.len() - self.busy_lines()
    }

    /// Whether any line is free
    pub fn has_free_line(&self) -> bool {
        self.lines.iter().any(|line| !line.is_occupied())
    }

    /// Tonnes being sorted
    pub fn load_in_stage(&self) -> f64 {
        self.lines.iter().filter_map(|line| line.current()).map(Lot::load).sum()
    }

    /// Put the batch on the first free line
    ///
    /// Callers check `has_free_line` first; calling this with every line busy
    /// is a contract violation.
    pub fn start_sort(&mut self, batch: Batch, clock: f64) -> SimulationResult<SortStarted> {
        let batch_id = batch.id();
        let line = self.lines.iter_mut().find(|line| !line.is_occupied()).ok_or_else(|| {
            SimulationError::contract_violation(format!("no free sorting line for {}", batch_id))
        })?;

        line.assign(batch)?;
        let finish = clock + line.processing_time()?;
        let line_id = line.id();

        debug!(batch = %batch_id, line = %line_id, finish, "Sort started");
        Ok(SortStarted {
            line: line_id,
            follow_up: FollowUp::new(finish, Event::SortingFinished { batch: batch_id, line: line_id }),
        })
    }

    /// Free the line and send the batch to the dryers at the same instant
    pub fn finish_sort(
        &mut self,
        line: SortLineId,
        batch: BatchId,
        clock: f64,
    ) -> SimulationResult<FollowUp> {
        let released = self
            .lines
            .get_mut(line.index())
            .ok_or_else(|| SimulationError::contract_violation(format!("unknown sorting line {}", line)))?
            .release()?;
        if released.id() != batch {
            return Err(SimulationError::contract_violation(format!(
                "line {} finished {} but was sorting {}",
                line,
                batch,
                released.id()
            )));
        }
        Ok(FollowUp::new(clock, Event::FillModule { batch: released }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GmoClass, HybridType};

    fn batch(id: u64) -> Batch {
        Batch::new(BatchId(id), HybridType(5), GmoClass::NonGmo, 0.34, 12.0, 0.0)
    }

    #[test]
    fn test_automatic_lines_first() {
        let mut stage = SortingStage::new(&SimulationConfig::default());
        assert_eq!(stage.lines().len(), 4);
        assert_eq!(stage.lines()[0].kind(), LineKind::Sort { mode: SortMode::Automatic });
        assert_eq!(stage.lines()[3].kind(), LineKind::Sort { mode: SortMode::Manual });

        let first = stage.start_sort(batch(1), 0.0).unwrap();
        assert_eq!(first.line, SortLineId(0));
        assert!((first.follow_up.time - 1.0).abs() < 1e-12);

        stage.start_sort(batch(2), 0.0).unwrap();
        let third = stage.start_sort(batch(3), 0.0).unwrap();
        assert_eq!(third.line, SortLineId(2));
        assert!((third.follow_up.time - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_full_stage_rejects_batch() {
        let mut stage = SortingStage::new(&SimulationConfig::default());
        for id in 1..=4 {
            stage.start_sort(batch(id), 0.0).unwrap();
        }
        assert!(!stage.has_free_line());
        assert_eq!(stage.busy_lines(), 4);
        assert_eq!(stage.free_lines(), 0);
        assert!((stage.load_in_stage() - 48.0).abs() < 1e-12);
        assert!(stage.start_sort(batch(5), 0.0).is_err());
    }

    #[test]
    fn test_finish_sort_yields_fill_module() {
        let mut stage = SortingStage::new(&SimulationConfig::default());
        stage.start_sort(batch(1), 0.0).unwrap();

        let follow_up = stage.finish_sort(SortLineId(0), BatchId(1), 1.0).unwrap();
        assert_eq!(follow_up.time, 1.0);
        assert!(matches!(follow_up.event, Event::FillModule { ref batch } if batch.id() == BatchId(1)));
        assert!(stage.has_free_line());
        assert_eq!(stage.free_lines(), 4);
        assert!(stage.finish_sort(SortLineId(0), BatchId(1), 1.0).is_err());
    }
}
