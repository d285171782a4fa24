//! Arrival and duration sources
//!
//! The plant consumes randomness only through two narrow traits. The
//! stochastic implementations reproduce the plant's sampling model; the
//! deterministic ones drive scenario tests and reproducible what-if runs.

use std::collections::BTreeMap;
use std::fmt;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Triangular, Uniform};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{GmoClass, HybridType, SimulationConfig};

/// Attempts at drawing a day with enough trucks for the day's hybrid count
const MAX_DAY_ATTEMPTS: usize = 10_000;

/// One truck announced for a day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrivalRecord {
    /// Hybrid type carried
    pub hybrid_type: HybridType,
    /// GMO class carried
    pub gmo: GmoClass,
    /// Hours since the previous truck of the day (or since day start)
    pub inter_arrival_delay: f64,
}

impl ArrivalRecord {
    /// Create an arrival record
    pub fn new(hybrid_type: HybridType, gmo: GmoClass, inter_arrival_delay: f64) -> Self {
        Self { hybrid_type, gmo, inter_arrival_delay }
    }
}

/// Produces the trucks of each operating day
pub trait ArrivalSource: fmt::Debug {
    /// Ordered arrivals for `day` (zero-based day index)
    fn arrivals_for_day(&mut self, day: u32) -> SimulationResult<Vec<ArrivalRecord>>;
}

/// Samples cleaning times and batch attributes
pub trait DurationSource: fmt::Debug {
    /// Cleaning time of an unloading line changing hybrid type (hours)
    fn unload_cleaning_time(&mut self) -> f64;

    /// Cleaning time of a shelling line changing hybrid type (hours)
    fn shelling_cleaning_time(&mut self) -> f64;

    /// Initial humidity fraction of a new batch
    fn batch_humidity(&mut self) -> f64;

    /// Load of a new batch (tonnes)
    fn batch_load(&mut self) -> f64;
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn checked_uniform(field: &str, low: f64, high: f64) -> SimulationResult<Uniform<f64>> {
    if !(low.is_finite() && high.is_finite() && low <= high) {
        return Err(SimulationError::configuration_error(format!(
            "invalid {} range {}..={}",
            field, low, high
        )));
    }
    Ok(Uniform::new_inclusive(low, high))
}

/// Poisson arrivals within a daily shift
///
/// Each day draws a number of distinct hybrid types, then exponential
/// inter-arrival gaps until the shift is over. Days with fewer trucks than
/// hybrid types are redrawn. Every drawn type is delivered at least once, the
/// remaining trucks repeat drawn types at random, and each truck is GMO with a
/// fixed probability.
#[derive(Debug)]
pub struct StochasticArrivals {
    rng: StdRng,
    inter_arrival: Exp<f64>,
    shift_hours: f64,
    hybrid_type_count: u32,
    min_daily_hybrids: u32,
    max_daily_hybrids: u32,
    gmo_probability: f64,
}

impl StochasticArrivals {
    /// Build from the configuration, seeded when `seed` is set
    pub fn from_config(config: &SimulationConfig, seed: Option<u64>) -> SimulationResult<Self> {
        let arrivals = &config.arrivals;
        let inter_arrival = Exp::new(arrivals.rate).map_err(|err| {
            SimulationError::configuration_error(format!(
                "invalid arrival rate {}: {}",
                arrivals.rate, err
            ))
        })?;
        if arrivals.min_daily_hybrids == 0
            || arrivals.min_daily_hybrids > arrivals.max_daily_hybrids
            || arrivals.max_daily_hybrids > arrivals.hybrid_type_count
        {
            return Err(SimulationError::configuration_error(format!(
                "daily hybrid range {}-{} does not fit {} types",
                arrivals.min_daily_hybrids, arrivals.max_daily_hybrids, arrivals.hybrid_type_count
            )));
        }
        if !(0.0..=1.0).contains(&arrivals.gmo_probability) {
            return Err(SimulationError::configuration_error(format!(
                "GMO probability {} is not a fraction",
                arrivals.gmo_probability
            )));
        }

        Ok(Self {
            rng: seeded_rng(seed),
            inter_arrival,
            shift_hours: arrivals.shift_hours,
            hybrid_type_count: arrivals.hybrid_type_count,
            min_daily_hybrids: arrivals.min_daily_hybrids,
            max_daily_hybrids: arrivals.max_daily_hybrids,
            gmo_probability: arrivals.gmo_probability,
        })
    }

    fn draw_gaps(&mut self, minimum: usize) -> SimulationResult<Vec<f64>> {
        for _ in 0..MAX_DAY_ATTEMPTS {
            let mut elapsed = 0.0;
            let mut gaps = Vec::new();
            loop {
                let gap = self.inter_arrival.sample(&mut self.rng);
                elapsed += gap;
                if elapsed > self.shift_hours {
                    break;
                }
                gaps.push(gap);
            }
            if gaps.len() >= minimum {
                return Ok(gaps);
            }
        }
        Err(SimulationError::arrival_source_error(format!(
            "no day with at least {} arrivals after {} attempts",
            minimum, MAX_DAY_ATTEMPTS
        )))
    }
}

impl ArrivalSource for StochasticArrivals {
    fn arrivals_for_day(&mut self, day: u32) -> SimulationResult<Vec<ArrivalRecord>> {
        let hybrid_count =
            self.rng.gen_range(self.min_daily_hybrids..=self.max_daily_hybrids) as usize;
        let gaps = self.draw_gaps(hybrid_count)?;

        let drawn: Vec<HybridType> =
            rand::seq::index::sample(&mut self.rng, self.hybrid_type_count as usize, hybrid_count)
                .into_iter()
                .map(|index| HybridType(index as u32 + 1))
                .collect();

        let mut types = drawn.clone();
        while types.len() < gaps.len() {
            let repeat = drawn[self.rng.gen_range(0..drawn.len())];
            types.push(repeat);
        }
        types.shuffle(&mut self.rng);

        let records: Vec<ArrivalRecord> = types
            .into_iter()
            .zip(gaps)
            .map(|(hybrid_type, gap)| {
                let gmo = GmoClass::from(self.rng.gen_bool(self.gmo_probability));
                ArrivalRecord::new(hybrid_type, gmo, gap)
            })
            .collect();

        debug!(day, trucks = records.len(), hybrids = hybrid_count, "Drew daily arrivals");
        Ok(records)
    }
}

/// Pre-recorded arrivals keyed by day; days without a script have no trucks
#[derive(Debug, Clone, Default)]
pub struct ScriptedArrivals {
    days: BTreeMap<u32, Vec<ArrivalRecord>>,
}

impl ScriptedArrivals {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the arrivals of one day
    pub fn with_day(mut self, day: u32, records: Vec<ArrivalRecord>) -> Self {
        self.days.insert(day, records);
        self
    }
}

impl ArrivalSource for ScriptedArrivals {
    fn arrivals_for_day(&mut self, day: u32) -> SimulationResult<Vec<ArrivalRecord>> {
        let records = self.days.get(&day).cloned().unwrap_or_default();
        if let Some(bad) = records
            .iter()
            .find(|record| !(record.inter_arrival_delay >= 0.0 && record.inter_arrival_delay.is_finite()))
        {
            return Err(SimulationError::arrival_source_error(format!(
                "day {} has invalid inter-arrival delay {}",
                day, bad.inter_arrival_delay
            )));
        }
        Ok(records)
    }
}

/// Random cleaning times, humidity and loads
#[derive(Debug)]
pub struct StochasticDurations {
    rng: StdRng,
    unload_cleaning: Triangular<f64>,
    shelling_cleaning: Uniform<f64>,
    humidity_percent: Uniform<u32>,
    load: Uniform<f64>,
}

impl StochasticDurations {
    /// Build from the configuration, seeded when `seed` is set
    ///
    /// Humidity is drawn as a whole percentage between the configured bounds.
    pub fn from_config(config: &SimulationConfig, seed: Option<u64>) -> SimulationResult<Self> {
        let cleaning = config.unloading.cleaning;
        let unload_cleaning =
            Triangular::new(cleaning.low, cleaning.high, cleaning.mode).map_err(|err| {
                SimulationError::configuration_error(format!(
                    "invalid unload cleaning distribution: {}",
                    err
                ))
            })?;
        let shelling_cleaning = checked_uniform(
            "shelling cleaning",
            config.shelling.cleaning.low,
            config.shelling.cleaning.high,
        )?;
        let load = checked_uniform("truck load", config.arrivals.load.low, config.arrivals.load.high)?;

        let humidity = config.arrivals.humidity;
        let low = (humidity.low * 100.0).round();
        let high = (humidity.high * 100.0).round();
        if !(low >= 0.0 && low <= high) {
            return Err(SimulationError::configuration_error(format!(
                "invalid humidity range {}..={}",
                humidity.low, humidity.high
            )));
        }
        let humidity_percent = Uniform::new_inclusive(low as u32, high as u32);

        Ok(Self { rng: seeded_rng(seed), unload_cleaning, shelling_cleaning, humidity_percent, load })
    }
}

impl DurationSource for StochasticDurations {
    fn unload_cleaning_time(&mut self) -> f64 {
        self.unload_cleaning.sample(&mut self.rng).max(0.0)
    }

    fn shelling_cleaning_time(&mut self) -> f64 {
        self.shelling_cleaning.sample(&mut self.rng).max(0.0)
    }

    fn batch_humidity(&mut self) -> f64 {
        f64::from(self.humidity_percent.sample(&mut self.rng)) / 100.0
    }

    fn batch_load(&mut self) -> f64 {
        self.load.sample(&mut self.rng)
    }
}

/// Constant durations; loads may cycle through a fixed sequence
#[derive(Debug, Clone)]
pub struct FixedDurations {
    /// Unloading cleaning time (hours)
    pub unload_cleaning: f64,
    /// Shelling cleaning time (hours)
    pub shelling_cleaning: f64,
    /// Humidity of every batch
    pub humidity: f64,
    /// Load of every batch, unless a sequence is set
    pub load: f64,
    loads: Vec<f64>,
    next_load: usize,
}

impl FixedDurations {
    /// Fixed humidity and load, half-hour unload cleaning, 25 minute shelling cleaning
    pub fn new(humidity: f64, load: f64) -> Self {
        Self {
            unload_cleaning: 0.5,
            shelling_cleaning: 25.0 / 60.0,
            humidity,
            load,
            loads: Vec::new(),
            next_load: 0,
        }
    }

    /// Set both cleaning times
    pub fn with_cleaning(mut self, unload: f64, shelling: f64) -> Self {
        self.unload_cleaning = unload;
        self.shelling_cleaning = shelling;
        self
    }

    /// Hand out these loads in order, cycling when exhausted
    pub fn with_load_sequence(mut self, loads: Vec<f64>) -> Self {
        self.loads = loads;
        self.next_load = 0;
        self
    }
}

impl Default for FixedDurations {
    fn default() -> Self {
        Self::new(0.34, 15.0)
    }
}

impl DurationSource for FixedDurations {
    fn unload_cleaning_time(&mut self) -> f64 {
        self.unload_cleaning
    }

    fn shelling_cleaning_time(&mut self) -> f64 {
        self.shelling_cleaning
    }

    fn batch_humidity(&mut self) -> f64 {
        self.humidity
    }

    fn batch_load(&mut self) -> f64 {
        if self.loads.is_empty() {
            return self.load;
        }
        let load = self.loads[self.next_load % self.loads.len()];
        self.next_load += 1;
        load
    }
}
