//! Statistics collection and reporting
//!
//! `PlantStatistics` is the single source of truth for what happened during a
//! run: received, processed and lost load, queue waits, dwell times and the
//! busy-time integral of every resource class. Sinks format it for output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::time::Duration;

use crate::batch::{Lot, MixedBatch};
use crate::simulation::SimulationResult;
use crate::types::{HybridType, LossCause, ResourceClass, RunId};

/// Count of batches and their total load
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    /// Number of batches
    pub batches: usize,
    /// Tonnes
    pub load: f64,
}

impl Tally {
    /// Add `batches` batches weighing `load` tonnes in total
    pub fn add(&mut self, batches: usize, load: f64) {
        self.batches += batches;
        self.load += load;
    }
}

/// Cleaning cycles run by a resource class
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningTally {
    /// Number of cleaning cycles
    pub count: usize,
    /// Total hours spent cleaning
    pub hours: f64,
}

/// Counters accumulated by the plant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantStatistics {
    /// Identifier of the run
    pub run_id: RunId,
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,

    /// Trucks received
    pub received: Tally,
    /// Batches fully shelled
    pub processed: Tally,
    /// Shelled load per hybrid type
    pub processed_by_hybrid: BTreeMap<HybridType, Tally>,
    /// Losses by cause
    pub losses: BTreeMap<LossCause, Tally>,

    /// Sum of queue waits of batches that started unloading (hours)
    pub queue_wait_total: f64,
    /// Number of batches that started unloading
    pub queue_wait_count: usize,
    /// Longest queue wait observed (hours)
    pub queue_wait_max: f64,
    /// Sum of arrival-to-shelled times of processed batches (hours)
    pub dwell_total: f64,

    /// Busy-time integral per resource class (unit-hours)
    pub busy_time: BTreeMap<ResourceClass, f64>,
    /// Number of units per resource class
    pub capacity: BTreeMap<ResourceClass, usize>,
    /// Cleaning cycles per resource class
    pub cleaning: BTreeMap<ResourceClass, CleaningTally>,
    /// Dryer modules closed for drying
    pub modules_closed: usize,
    /// Dried lots shelled
    pub lots_shelled: usize,

    /// Simulated hours covered by the counters
    pub elapsed_hours: f64,
    /// Days covered by the run
    pub days_simulated: u32,
    /// Days on which trucks arrived
    pub operating_days: u32,
    /// Events dispatched
    pub events_dispatched: u64,
    /// Wall-clock duration of the run
    pub simulation_duration: Duration,
}

impl PlantStatistics {
    /// Create zeroed statistics for a plant with the given resource counts
    pub fn new(capacity: BTreeMap<ResourceClass, usize>) -> Self {
        Self {
            run_id: RunId::new(),
            started_at: Utc::now(),
            received: Tally::default(),
            processed: Tally::default(),
            processed_by_hybrid: BTreeMap::new(),
            losses: LossCause::ALL.iter().map(|cause| (*cause, Tally::default())).collect(),
            queue_wait_total: 0.0,
            queue_wait_count: 0,
            queue_wait_max: 0.0,
            dwell_total: 0.0,
            busy_time: ResourceClass::ALL.iter().map(|class| (*class, 0.0)).collect(),
            capacity,
            cleaning: BTreeMap::new(),
            modules_closed: 0,
            lots_shelled: 0,
            elapsed_hours: 0.0,
            days_simulated: 0,
            operating_days: 0,
            events_dispatched: 0,
            simulation_duration: Duration::from_secs(0),
        }
    }

    /// Zero every counter.
    ///
    /// Run identity, resource counts and the wall-clock bookkeeping
    /// (`started_at`, `simulation_duration`) are kept.
    pub fn reset(&mut self) {
        self.received = Tally::default();
        self.processed = Tally::default();
        self.processed_by_hybrid.clear();
        self.losses.values_mut().for_each(|tally| *tally = Tally::default());
        self.queue_wait_total = 0.0;
        self.queue_wait_count = 0;
        self.queue_wait_max = 0.0;
        self.dwell_total = 0.0;
        self.busy_time.values_mut().for_each(|busy| *busy = 0.0);
        self.cleaning.clear();
        self.modules_closed = 0;
        self.lots_shelled = 0;
        self.elapsed_hours = 0.0;
        self.days_simulated = 0;
        self.operating_days = 0;
        self.events_dispatched = 0;
    }

    /// A truck entered the plant
    pub fn record_arrival(&mut self, load: f64) {
        self.received.add(1, load);
    }

    /// A batch left the queue for an unloading line
    pub fn record_queue_wait(&mut self, wait: f64) {
        self.queue_wait_total += wait;
        self.queue_wait_count += 1;
        self.queue_wait_max = self.queue_wait_max.max(wait);
    }

    /// A line ran a cleaning cycle
    pub fn record_cleaning(&mut self, class: ResourceClass, hours: f64) {
        if hours > 0.0 {
            let tally = self.cleaning.entry(class).or_default();
            tally.count += 1;
            tally.hours += hours;
        }
    }

    /// A batch was lost
    pub fn record_loss(&mut self, cause: LossCause, load: f64) {
        self.losses.entry(cause).or_default().add(1, load);
    }

    /// A dried lot finished shelling at `clock`
    pub fn record_processed(&mut self, mixed: &MixedBatch, clock: f64) {
        self.processed.add(mixed.len(), mixed.load());
        self.processed_by_hybrid
            .entry(mixed.hybrid_type())
            .or_default()
            .add(mixed.len(), mixed.load());
        self.dwell_total += mixed.total_dwell(clock);
        self.lots_shelled += 1;
    }

    /// Integrate occupancy over `delta` hours
    pub fn advance(&mut self, delta: f64, occupancy: &[(ResourceClass, usize)]) {
        if delta <= 0.0 {
            return;
        }
        for (class, busy) in occupancy {
            *self.busy_time.entry(*class).or_insert(0.0) += delta * *busy as f64;
        }
        self.elapsed_hours += delta;
    }

    /// Loss tally of one cause
    pub fn loss(&self, cause: LossCause) -> Tally {
        self.losses.get(&cause).copied().unwrap_or_default()
    }

    /// Tonnes lost across all causes
    pub fn lost_load(&self) -> f64 {
        self.losses.values().map(|tally| tally.load).sum()
    }

    /// Batches lost across all causes
    pub fn lost_batches(&self) -> usize {
        self.losses.values().map(|tally| tally.batches).sum()
    }

    /// Processed plus lost load
    pub fn accounted_load(&self) -> f64 {
        self.processed.load + self.lost_load()
    }

    /// Fraction of received load that was shelled
    pub fn processed_fraction(&self) -> f64 {
        if self.received.load == 0.0 {
            0.0
        } else {
            self.processed.load / self.received.load
        }
    }

    /// Busy time divided by available unit-hours
    pub fn utilization(&self, class: ResourceClass) -> f64 {
        let units = self.capacity.get(&class).copied().unwrap_or(0);
        let available = units as f64 * self.elapsed_hours;
        if available == 0.0 {
            0.0
        } else {
            self.busy_time.get(&class).copied().unwrap_or(0.0) / available
        }
    }

    /// Mean queue wait of batches that started unloading (hours)
    pub fn average_queue_wait(&self) -> f64 {
        if self.queue_wait_count == 0 {
            0.0
        } else {
            self.queue_wait_total / self.queue_wait_count as f64
        }
    }

    /// Mean arrival-to-shelled time of processed batches (hours)
    pub fn average_dwell_time(&self) -> f64 {
        if self.processed.batches == 0 {
            0.0
        } else {
            self.dwell_total / self.processed.batches as f64
        }
    }

    /// Mean received load per operating day
    pub fn average_received_per_day(&self) -> f64 {
        if self.operating_days == 0 {
            0.0
        } else {
            self.received.load / f64::from(self.operating_days)
        }
    }

    /// Generate a comprehensive summary report
    pub fn generate_summary_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Grain Plant Simulation Report ===\n\n");
        report.push_str(&format!("Run: {} (started {})\n", self.run_id, self.started_at.to_rfc3339()));
        report.push_str(&format!(
            "Simulated: {:.1} h over {} days ({} operating), {} events in {:.2} s\n\n",
            self.elapsed_hours,
            self.days_simulated,
            self.operating_days,
            self.events_dispatched,
            self.simulation_duration.as_secs_f64()
        ));

        report.push_str("Material Balance:\n");
        report.push_str(&format!(
            "  • Received: {} trucks, {:.1} t (avg {:.1} t/operating day)\n",
            self.received.batches,
            self.received.load,
            self.average_received_per_day()
        ));
        report.push_str(&format!(
            "  • Processed: {} batches, {:.1} t ({:.1}%)\n",
            self.processed.batches,
            self.processed.load,
            self.processed_fraction() * 100.0
        ));
        report.push_str(&format!(
            "  • Lost: {} batches, {:.1} t\n",
            self.lost_batches(),
            self.lost_load()
        ));
        for cause in LossCause::ALL {
            let tally = self.loss(cause);
            report.push_str(&format!(
                "      - {}: {} batches, {:.1} t\n",
                cause, tally.batches, tally.load
            ));
        }
        report.push_str(&format!(
            "  • In plant at end: {:.1} t\n\n",
            (self.received.load - self.accounted_load()).max(0.0)
        ));

        report.push_str("Timing:\n");
        report.push_str(&format!(
            "  • Average queue wait: {:.2} h (max {:.2} h)\n",
            self.average_queue_wait(),
            self.queue_wait_max
        ));
        report.push_str(&format!("  • Average dwell time: {:.2} h\n\n", self.average_dwell_time()));

        report.push_str("Resource Utilization:\n");
        for class in ResourceClass::ALL {
            let cleaning = self.cleaning.get(&class).copied().unwrap_or_default();
            report.push_str(&format!(
                "  • {}: {:.1}% of {} units",
                class,
                self.utilization(class) * 100.0,
                self.capacity.get(&class).copied().unwrap_or(0)
            ));
            if cleaning.count > 0 {
                report.push_str(&format!(
                    ", {} cleanings ({:.1} h)",
                    cleaning.count, cleaning.hours
                ));
            }
            report.push('\n');
        }
        report.push_str(&format!(
            "  • Modules closed: {}, lots shelled: {}\n",
            self.modules_closed, self.lots_shelled
        ));

        if !self.processed_by_hybrid.is_empty() {
            report.push_str("\nProcessed by Hybrid Type:\n");
            for (hybrid, tally) in &self.processed_by_hybrid {
                report.push_str(&format!(
                    "  • {}: {} batches, {:.1} t\n",
                    hybrid, tally.batches, tally.load
                ));
            }
        }

        report
    }

    /// Generate a compact one-line summary suitable for logging
    pub fn generate_compact_summary(&self) -> String {
        format!(
            "Plant: {} days, received {:.1} t, processed {:.1} t, lost {:.1} t (queue {:.1}, sorting {:.1}, drying {:.1})",
            self.days_simulated,
            self.received.load,
            self.processed.load,
            self.lost_load(),
            self.loss(LossCause::QueueTimeout).load,
            self.loss(LossCause::SortingCapacity).load,
            self.loss(LossCause::DryingCapacity).load
        )
    }
}

impl Default for PlantStatistics {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl fmt::Display for PlantStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.generate_summary_report())
    }
}

/// Receives the final statistics of a run
pub trait StatisticsSink {
    /// Format and persist the statistics
    fn publish(&mut self, statistics: &PlantStatistics) -> SimulationResult<()>;
}

/// Human-readable report
#[derive(Debug)]
pub struct TextReport<W: Write> {
    writer: W,
}

impl<W: Write> TextReport<W> {
    /// Write the report to `writer`
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StatisticsSink for TextReport<W> {
    fn publish(&mut self, statistics: &PlantStatistics) -> SimulationResult<()> {
        self.writer.write_all(statistics.generate_summary_report().as_bytes())?;
        writeln!(self.writer, "\nSummary: {}", statistics.generate_compact_summary())?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Pretty-printed JSON document
#[derive(Debug)]
pub struct JsonReport<W: Write> {
    writer: W,
}

impl<W: Write> JsonReport<W> {
    /// Write the report to `writer`
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StatisticsSink for JsonReport<W> {
    fn publish(&mut self, statistics: &PlantStatistics) -> SimulationResult<()> {
        serde_json::to_writer_pretty(&mut self.writer, statistics)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
