//! Plant event loop
//!
//! The `Plant` owns the clock, the event queue and the four stage
//! controllers. It pops events in time order, integrates resource occupancy
//! between events and dispatches each event to the stage that handles it.
//! Stages hand back follow-up events which the plant schedules.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::batch::{Batch, Lot};
use crate::simulation::{
    ArrivalRecord, ArrivalSource, Calendar, DurationSource, Event, EventQueue, PlantStatistics,
    ScheduledEvent, SimulationError, SimulationResult, StochasticArrivals, StochasticDurations,
};
use crate::stages::{DryingStage, FollowUp, ShellingStage, SortingStage, UnloadingStage};
use crate::types::{
    BatchId, BatchIdAllocator, LossCause, ModuleRef, ResourceClass, ShellLineId, SimulationConfig,
    SortLineId, UnloadLineId,
};

/// The simulated plant
pub struct Plant {
    config: SimulationConfig,
    clock: f64,
    queue: EventQueue,
    calendar: Calendar,
    unloading: UnloadingStage,
    sorting: SortingStage,
    drying: DryingStage,
    shelling: ShellingStage,
    arrivals: Box<dyn ArrivalSource>,
    durations: Box<dyn DurationSource>,
    ids: BatchIdAllocator,
    /// Batches off an unloading line whose `sorting_ready` is still pending
    awaiting_sort: usize,
    stats: PlantStatistics,
    journal: Option<Vec<ScheduledEvent>>,
    event_log: Option<Box<dyn Write>>,
}

impl fmt::Debug for Plant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plant")
            .field("clock", &self.clock)
            .field("pending_events", &self.queue.len())
            .field("unloading", &self.unloading)
            .field("sorting", &self.sorting)
            .field("drying", &self.drying)
            .field("shelling", &self.shelling)
            .field("awaiting_sort", &self.awaiting_sort)
            .field("arrivals", &self.arrivals)
            .field("durations", &self.durations)
            .field("journal", &self.journal.as_ref().map(Vec::len))
            .field("event_log", &self.event_log.is_some())
            .finish()
    }
}

impl Plant {
    /// Build a plant with explicit arrival and duration sources
    ///
    /// The configuration is validated and the first day boundary is
    /// scheduled at t = 0.
    #[instrument(skip_all, fields(days = config.days, seed = ?config.seed))]
    pub fn new<A, D>(config: SimulationConfig, arrivals: A, durations: D) -> SimulationResult<Self>
    where
        A: ArrivalSource + 'static,
        D: DurationSource + 'static,
    {
        config.validate()?;

        let capacity: BTreeMap<ResourceClass, usize> = [
            (ResourceClass::Unloading, config.unloading.line_count),
            (ResourceClass::Sorting, config.sorting.line_count()),
            (ResourceClass::DryerModules, config.drying.total_modules()),
            (ResourceClass::Shelling, config.shelling.lines.len()),
        ]
        .into_iter()
        .collect();

        let mut plant = Self {
            calendar: Calendar::from_config(&config),
            unloading: UnloadingStage::new(&config),
            sorting: SortingStage::new(&config),
            drying: DryingStage::new(&config),
            shelling: ShellingStage::new(&config),
            clock: 0.0,
            queue: EventQueue::new(),
            arrivals: Box::new(arrivals),
            durations: Box::new(durations),
            ids: BatchIdAllocator::new(),
            awaiting_sort: 0,
            stats: PlantStatistics::new(capacity),
            journal: None,
            event_log: None,
            config,
        };
        plant.schedule(0.0, Event::NextDay)?;

        info!(
            run_id = %plant.stats.run_id,
            unload_lines = plant.config.unloading.line_count,
            sort_lines = plant.config.sorting.line_count(),
            modules = plant.config.drying.total_modules(),
            shelling_lines = plant.config.shelling.lines.len(),
            "Plant initialized"
        );
        Ok(plant)
    }

    /// Build a plant with the stochastic sources
    ///
    /// When the configuration carries a seed, arrivals use it and durations
    /// use the next value so the two streams are independent.
    pub fn from_config(config: SimulationConfig) -> SimulationResult<Self> {
        let arrivals = StochasticArrivals::from_config(&config, config.seed)?;
        let durations =
            StochasticDurations::from_config(&config, config.seed.map(|seed| seed.wrapping_add(1)))?;
        Self::new(config, arrivals, durations)
    }

    /// Keep every dispatched event in memory
    pub fn with_journal(mut self) -> Self {
        self.journal = Some(Vec::new());
        self
    }

    /// Write every dispatched event as one JSON line
    pub fn with_event_log<W: Write + 'static>(mut self, writer: W) -> Self {
        self.event_log = Some(Box::new(writer));
        self
    }

    /// Current simulation time (hours)
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Configuration the plant was built from
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Day and weekday bookkeeping
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Counters accumulated so far
    pub fn statistics(&self) -> &PlantStatistics {
        &self.stats
    }

    /// Zero the counters; resource pools and pending events are kept
    pub fn reset_statistics(&mut self) {
        self.stats.reset();
        info!(clock = self.clock, "Statistics reset");
    }

    /// Unloading queue and lines
    pub fn unloading(&self) -> &UnloadingStage {
        &self.unloading
    }

    /// Sorting lines
    pub fn sorting(&self) -> &SortingStage {
        &self.sorting
    }

    /// Dryers
    pub fn drying(&self) -> &DryingStage {
        &self.drying
    }

    /// Ready pool and shelling lines
    pub fn shelling(&self) -> &ShellingStage {
        &self.shelling
    }

    /// Number of scheduled events not yet dispatched
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Dispatched events, when journaling is enabled
    pub fn journal(&self) -> Option<&[ScheduledEvent]> {
        self.journal.as_deref()
    }

    /// Tonnes currently inside the plant, including batches carried by pending events
    pub fn in_flight_load(&self) -> f64 {
        let pending: f64 = self.queue.iter().map(|scheduled| scheduled.event().carried_load()).sum();
        self.unloading.load_in_stage()
            + self.sorting.load_in_stage()
            + self.drying.load_in_stage()
            + self.shelling.load_in_stage()
            + pending
    }

    /// Run the configured number of days
    pub fn simulate(&mut self) -> SimulationResult<()> {
        self.run(self.config.horizon_hours())
    }

    /// Dispatch events until the next one is at or past `horizon`
    ///
    /// On return the clock equals `horizon`.
    #[instrument(skip(self), fields(run_id = %self.stats.run_id))]
    pub fn run(&mut self, horizon: f64) -> SimulationResult<()> {
        if !horizon.is_finite() || horizon < self.clock {
            return Err(SimulationError::scheduling_error(format!(
                "horizon {} is not a finite time after the clock {}",
                horizon, self.clock
            )));
        }

        let _span = crate::perf_span!("plant_run", horizon = horizon).entered();
        let started = Instant::now();

        while let Some(next) = self.queue.peek_time() {
            if next >= horizon {
                break;
            }
            let Some(scheduled) = self.queue.pop() else {
                break;
            };
            self.advance_to(scheduled.time());
            self.record_dispatch(&scheduled)?;
            self.dispatch(scheduled.into_event())?;
        }
        self.advance_to(horizon);

        if let Some(writer) = self.event_log.as_mut() {
            writer.flush()?;
        }
        self.stats.simulation_duration += started.elapsed();

        crate::sim_event!(
            info,
            "Run finished",
            clock = self.clock,
            received = self.stats.received.load,
            processed = self.stats.processed.load,
            lost = self.stats.lost_load(),
            in_flight = self.in_flight_load(),
        );
        Ok(())
    }

    /// Schedule an event; the time may not precede the clock
    pub fn schedule(&mut self, time: f64, event: Event) -> SimulationResult<()> {
        if !time.is_finite() || time < self.clock {
            return Err(SimulationError::scheduling_error(format!(
                "{} scheduled at {} with the clock at {}",
                event.kind(),
                time,
                self.clock
            )));
        }
        self.queue.push(time, event);
        Ok(())
    }

    fn schedule_follow_up(&mut self, follow_up: FollowUp) -> SimulationResult<()> {
        self.schedule(follow_up.time, follow_up.event)
    }

    fn occupancy(&self) -> [(ResourceClass, usize); 4] {
        [
            (ResourceClass::Unloading, self.unloading.busy_lines()),
            (ResourceClass::Sorting, self.sorting.busy_lines()),
            (ResourceClass::DryerModules, self.drying.modules_in_use()),
            (ResourceClass::Shelling, self.shelling.busy_lines()),
        ]
    }

    fn advance_to(&mut self, time: f64) {
        let occupancy = self.occupancy();
        self.stats.advance(time - self.clock, &occupancy);
        self.clock = time;
    }

    fn record_dispatch(&mut self, scheduled: &ScheduledEvent) -> SimulationResult<()> {
        self.stats.events_dispatched += 1;
        debug!(time = scheduled.time(), kind = scheduled.event().kind(), "Dispatching event");

        if let Some(writer) = self.event_log.as_mut() {
            serde_json::to_writer(writer.as_mut(), scheduled)?;
            writeln!(writer)?;
        }
        if let Some(journal) = self.journal.as_mut() {
            journal.push(scheduled.clone());
        }
        Ok(())
    }

    fn dispatch(&mut self, event: Event) -> SimulationResult<()> {
        match event {
            Event::NextDay => self.on_next_day(),
            Event::TruckArrival { record } => self.on_truck_arrival(record),
            Event::QueueTimeout { batch } => self.on_queue_timeout(batch),
            Event::UnloadFinished { batch, line, .. } => self.on_unload_finished(line, batch),
            Event::SortingReady { batch } => self.on_sorting_ready(batch),
            Event::SortingFinished { batch, line } => self.on_sorting_finished(line, batch),
            Event::FillModule { batch } => self.on_fill_module(batch),
            Event::CloseModule { module } => self.on_close_module(module),
            Event::DryingFinished { module } => self.on_drying_finished(module),
            Event::ShellingFinished { line, module, .. } => self.on_shelling_finished(line, module),
        }
    }

    fn on_next_day(&mut self) -> SimulationResult<()> {
        let day = self.calendar.day_index(self.clock);
        let weekday = self.calendar.weekday(day);
        self.stats.days_simulated += 1;

        if self.calendar.is_operating_day(day) {
            let records = self.arrivals.arrivals_for_day(day)?;
            let mut time = self.calendar.day_start(self.clock);
            for record in &records {
                if !(record.inter_arrival_delay >= 0.0 && record.inter_arrival_delay.is_finite()) {
                    return Err(SimulationError::arrival_source_error(format!(
                        "day {} has invalid inter-arrival delay {}",
                        day, record.inter_arrival_delay
                    )));
                }
                time += record.inter_arrival_delay;
                self.schedule(time, Event::TruckArrival { record: *record })?;
            }
            self.stats.operating_days += 1;
            info!(day, weekday = %weekday, trucks = records.len(), "Day started");
        } else {
            info!(day, weekday = %weekday, "Non-operating day, no arrivals");
        }

        let next = self.calendar.next_day_start(self.clock);
        self.schedule(next, Event::NextDay)
    }

    fn on_truck_arrival(&mut self, record: ArrivalRecord) -> SimulationResult<()> {
        let id = self.ids.allocate();
        let humidity = self.durations.batch_humidity();
        let load = self.durations.batch_load();
        let batch = Batch::new(id, record.hybrid_type, record.gmo, humidity, load, self.clock);

        self.stats.record_arrival(batch.load());
        self.schedule(self.clock + self.unloading.patience(), Event::QueueTimeout { batch: id })?;
        debug!(
            batch = %id,
            hybrid_type = %batch.hybrid_type(),
            gmo = %batch.gmo(),
            load = batch.load(),
            queue = self.unloading.queue_len(),
            "Truck arrived"
        );

        self.unloading.enqueue(batch);
        self.start_unloading()
    }

    fn on_queue_timeout(&mut self, batch: BatchId) -> SimulationResult<()> {
        match self.unloading.expire(batch)? {
            Some(expired) => self.record_loss(&expired, LossCause::QueueTimeout),
            None => debug!(batch = %batch, "Timeout after unloading started, ignored"),
        }
        Ok(())
    }

    fn on_unload_finished(&mut self, line: UnloadLineId, batch: BatchId) -> SimulationResult<()> {
        let follow_up = self.unloading.finish_unload(line, batch, self.clock)?;
        self.schedule_follow_up(follow_up)?;
        self.awaiting_sort += 1;
        self.start_unloading()
    }

    fn on_sorting_ready(&mut self, batch: Batch) -> SimulationResult<()> {
        self.awaiting_sort = self.awaiting_sort.saturating_sub(1);
        if !self.sorting.has_free_line() {
            self.record_loss(&batch, LossCause::SortingCapacity);
            return Ok(());
        }
        let started = self.sorting.start_sort(batch, self.clock)?;
        self.schedule_follow_up(started.follow_up)
    }

    fn on_sorting_finished(&mut self, line: SortLineId, batch: BatchId) -> SimulationResult<()> {
        let follow_up = self.sorting.finish_sort(line, batch, self.clock)?;
        self.schedule_follow_up(follow_up)?;
        if self.config.unloading.requires_free_sorter {
            self.start_unloading()?;
        }
        Ok(())
    }

    fn on_fill_module(&mut self, batch: Batch) -> SimulationResult<()> {
        let Some(module) = self.drying.route(&batch) else {
            self.record_loss(&batch, LossCause::DryingCapacity);
            return Ok(());
        };
        if let Some(closing) = self.drying.load(batch, module, self.clock)? {
            self.schedule_follow_up(closing)?;
        }
        if cfg!(debug_assertions) {
            self.drying.check_indices()?;
        }
        Ok(())
    }

    fn on_close_module(&mut self, module: ModuleRef) -> SimulationResult<()> {
        let finished = self.drying.close(module, self.clock)?;
        self.stats.modules_closed += 1;
        self.schedule_follow_up(finished)
    }

    fn on_drying_finished(&mut self, module: ModuleRef) -> SimulationResult<()> {
        let lot = self.drying.open(module, self.clock)?;
        debug!(module = %module, load = lot.load(), "Drying finished");
        self.shelling.push_ready(lot);
        self.start_shelling()
    }

    fn on_shelling_finished(&mut self, line: ShellLineId, module: ModuleRef) -> SimulationResult<()> {
        let lot = self.shelling.finish(line)?;
        if lot.module != module {
            return Err(SimulationError::contract_violation(format!(
                "line {} finished {} but was shelling {}",
                line, module, lot.module
            )));
        }

        self.stats.record_processed(&lot.mixed, self.clock);
        self.drying.unload(module)?;
        crate::sim_event!(
            debug,
            "Lot shelled",
            line = line.index(),
            batches = lot.mixed.len(),
            load = lot.load(),
        );
        self.start_shelling()
    }

    fn start_unloading(&mut self) -> SimulationResult<()> {
        loop {
            if self.config.unloading.requires_free_sorter && !self.sorter_available() {
                return Ok(());
            }
            let Some(started) = self.unloading.start_unload(self.clock, self.durations.as_mut())? else {
                return Ok(());
            };
            self.stats.record_queue_wait(started.queue_wait);
            self.stats.record_cleaning(ResourceClass::Unloading, started.cleaning);
            self.schedule_follow_up(started.follow_up)?;
        }
    }

    /// A sorting line is free for the next truck once every batch already
    /// on an unloading line or waiting to enter sorting has one too
    fn sorter_available(&self) -> bool {
        self.sorting.free_lines() > self.unloading.busy_lines() + self.awaiting_sort
    }

    fn start_shelling(&mut self) -> SimulationResult<()> {
        while let Some(started) = self.shelling.start_next(self.clock, self.durations.as_mut())? {
            self.stats.record_cleaning(ResourceClass::Shelling, started.cleaning);
            self.schedule_follow_up(started.follow_up)?;
        }
        Ok(())
    }

    fn record_loss(&mut self, batch: &Batch, cause: LossCause) {
        self.stats.record_loss(cause, batch.load());
        let cause_name = cause.to_string();
        crate::sim_event!(
            warn,
            "Batch lost",
            batch = batch.id().0,
            cause = cause_name.as_str(),
            load = batch.load(),
            clock = self.clock,
        );
    }
}
