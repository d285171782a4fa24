//! Configuration structures for the plant simulator
//!
//! This module contains the simulation configuration structure and validation logic
//! used to control the resources, rates and timeouts of the simulated plant.
//!
//! All times are expressed in hours, masses in tonnes and humidity as a fraction.
//! Parameters are grouped by stage; every group falls back to its defaults for
//! keys missing from a configuration file.

use super::{GmoClass, OutputFormat};
use chrono::Weekday;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Calendar constants
pub mod calendar {
    /// Length of a simulated day in hours
    pub const HOURS_PER_DAY: f64 = 24.0;
}

/// One dryer: GMO class, number of modules and per-module capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DryerSpec {
    /// GMO class every module of this dryer is restricted to
    pub gmo: GmoClass,
    /// Number of modules
    pub modules: usize,
    /// Capacity of each module (tonnes)
    pub module_capacity: f64,
}

impl DryerSpec {
    /// Create a dryer specification
    pub fn new(gmo: GmoClass, modules: usize, module_capacity: f64) -> Self {
        Self { gmo, modules, module_capacity }
    }
}

/// Triangular distribution bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangularRange {
    /// Lower bound
    pub low: f64,
    /// Most likely value
    pub mode: f64,
    /// Upper bound
    pub high: f64,
}

/// Uniform distribution bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformRange {
    /// Lower bound
    pub low: f64,
    /// Upper bound
    pub high: f64,
}

impl UniformRange {
    /// Create a range
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

/// Truck arrivals and the material they carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrivalConfig {
    /// Length of the daily receiving shift; trucks only arrive inside it (hours)
    pub shift_hours: f64,
    /// Truck arrivals per hour during the shift
    pub rate: f64,
    /// Truck load bounds (tonnes)
    pub load: UniformRange,
    /// Initial humidity bounds (fraction)
    pub humidity: UniformRange,
    /// Number of hybrid types in the catalogue (types are 1..=count)
    pub hybrid_type_count: u32,
    /// Minimum number of distinct hybrid types delivered per day
    pub min_daily_hybrids: u32,
    /// Maximum number of distinct hybrid types delivered per day
    pub max_daily_hybrids: u32,
    /// Probability that a truck carries GMO material (0.0-1.0)
    pub gmo_probability: f64,
}

impl Default for ArrivalConfig {
    fn default() -> Self {
        Self {
            shift_hours: 14.0,
            rate: 36.0 / 14.0,
            load: UniformRange::new(10.5, 21.0),
            humidity: UniformRange::new(0.33, 0.35),
            hybrid_type_count: 120,
            min_daily_hybrids: 6,
            max_daily_hybrids: 12,
            gmo_probability: 0.5,
        }
    }
}

/// Unloading queue and lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnloadingConfig {
    /// Number of unloading lines
    pub line_count: usize,
    /// Unloading rate (tonnes per hour)
    pub rate: f64,
    /// Cleaning time when a line changes hybrid type
    pub cleaning: TriangularRange,
    /// Maximum time a truck waits in the queue (hours)
    pub patience_hours: f64,
    /// Fraction of the patience after which the queue head bypasses affinity (0.0-1.0]
    pub starvation_fraction: f64,
    /// Only start unloading when a sorting line is free
    pub requires_free_sorter: bool,
}

impl Default for UnloadingConfig {
    fn default() -> Self {
        Self {
            line_count: 4,
            rate: 20.0,
            cleaning: TriangularRange { low: 20.0 / 60.0, mode: 30.0 / 60.0, high: 30.0 / 60.0 },
            patience_hours: 12.0,
            starvation_fraction: 0.75,
            requires_free_sorter: false,
        }
    }
}

impl UnloadingConfig {
    /// Time after which the head of the queue is served regardless of affinity
    pub fn starvation_threshold_hours(&self) -> f64 {
        self.starvation_fraction * self.patience_hours
    }
}

/// Sorting lines; automatic lines are served first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortingConfig {
    /// Number of automatic lines
    pub automatic_lines: usize,
    /// Number of manual lines
    pub manual_lines: usize,
    /// Automatic rate (tonnes per hour)
    pub automatic_rate: f64,
    /// Manual rate (tonnes per hour)
    pub manual_rate: f64,
}

impl Default for SortingConfig {
    fn default() -> Self {
        Self { automatic_lines: 2, manual_lines: 2, automatic_rate: 12.0, manual_rate: 4.0 }
    }
}

impl SortingConfig {
    /// Total number of sorting lines
    pub fn line_count(&self) -> usize {
        self.automatic_lines + self.manual_lines
    }
}

/// Dryers and the drying process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DryingConfig {
    /// Dryers in routing order
    pub dryers: Vec<DryerSpec>,
    /// Humidity fraction removed per hour of drying
    pub rate: f64,
    /// Humidity fraction at which drying ends
    pub target_humidity: f64,
    /// Hours a module stays open after receiving its first batch
    pub module_closure_hours: f64,
}

impl Default for DryingConfig {
    fn default() -> Self {
        Self {
            dryers: vec![
                DryerSpec::new(GmoClass::NonGmo, 3, 1300.0),
                DryerSpec::new(GmoClass::NonGmo, 4, 2000.0),
                DryerSpec::new(GmoClass::NonGmo, 2, 1740.0),
                DryerSpec::new(GmoClass::Gmo, 5, 2280.0),
                DryerSpec::new(GmoClass::Gmo, 3, 2280.0),
            ],
            rate: 0.025,
            target_humidity: 0.125,
            module_closure_hours: 7.0,
        }
    }
}

impl DryingConfig {
    /// Total number of modules across all dryers
    pub fn total_modules(&self) -> usize {
        self.dryers.iter().map(|dryer| dryer.modules).sum()
    }
}

/// Shelling lines, each bound to one GMO class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellingConfig {
    /// One entry per line, giving the GMO class it serves
    pub lines: Vec<GmoClass>,
    /// Shelling rate (tonnes per hour)
    pub rate: f64,
    /// Cleaning time when a line changes hybrid type
    pub cleaning: UniformRange,
}

impl Default for ShellingConfig {
    fn default() -> Self {
        Self {
            lines: vec![GmoClass::Gmo, GmoClass::NonGmo],
            rate: 25.0,
            cleaning: UniformRange::new(20.0 / 60.0, 30.0 / 60.0),
        }
    }
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "grain-plant-simulator",
    version,
    about = "Grain Plant Simulator - Discrete-event simulation of a grain receiving and drying plant",
    long_about = "Simulates trucks of grain arriving at a plant and flowing through unloading, sorting, drying and shelling, with limited typed resources, cleaning overhead, queue patience timeouts and loss accounting.

EXAMPLES:
    # Run with default settings (13 days)
    grain-plant-simulator

    # Use a configuration file
    grain-plant-simulator --config plant.json

    # Override specific settings
    grain-plant-simulator --days 7 --seed 42 --queue-patience-hours 8

    # Generate configuration template
    grain-plant-simulator --print-config > plant.json

    # Validate configuration without running
    grain-plant-simulator --config plant.json --dry-run

    # Write the JSON report and an event log
    grain-plant-simulator --output-format json --output report.json --event-log events.jsonl

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)"
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Number of days to simulate
    #[arg(
        long,
        help = "Number of days to simulate",
        long_help = "Number of days to simulate. Must be greater than 0. Default: 13"
    )]
    pub days: Option<usize>,

    /// Random seed for reproducible results
    #[arg(long, help = "Random seed for reproducible results")]
    pub seed: Option<u64>,

    /// Truck arrival rate during the shift (arrivals per hour)
    #[arg(long, help = "Truck arrivals per hour during the receiving shift")]
    pub arrival_rate: Option<f64>,

    /// Maximum time a truck waits in the unloading queue (hours)
    #[arg(long, help = "Queue patience timeout in hours")]
    pub queue_patience_hours: Option<f64>,

    /// Fraction of the patience after which the queue head is served first
    #[arg(long, help = "Starvation threshold as a fraction of the patience (0.0-1.0]")]
    pub starvation_fraction: Option<f64>,

    /// Number of unloading lines
    #[arg(long, help = "Number of unloading lines")]
    pub unload_lines: Option<usize>,

    /// Hours a dryer module stays open after its first load
    #[arg(long, help = "Hours before an open dryer module is closed for drying")]
    pub module_closure_hours: Option<f64>,

    /// Only start unloading when a sorting line is free
    #[arg(long, help = "Only start unloading when a sorting line is free")]
    pub unload_requires_free_sorter: bool,

    /// Output format for the final report
    #[arg(
        long,
        help = "Report format (text or json)",
        long_help = "Output format for the final statistics report. Supported formats: text, json. Default: text"
    )]
    pub output_format: Option<String>,

    /// Output path for the final report (stderr/stdout when omitted)
    #[arg(long, help = "Write the final report to this file")]
    pub output: Option<String>,

    /// Output path for the JSONL event log
    #[arg(long, help = "Write every dispatched event as a JSON line to this file")]
    pub event_log: Option<String>,

    /// Directory for rolling log files
    #[arg(long, help = "Also write JSON logs to a daily rolling file in this directory")]
    pub log_dir: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,
}

/// Configuration for the plant simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of days to simulate
    pub days: usize,

    /// Random seed for reproducible results
    pub seed: Option<u64>,

    /// Truck arrivals
    pub arrivals: ArrivalConfig,

    /// Unloading queue and lines
    pub unloading: UnloadingConfig,

    /// Sorting lines
    pub sorting: SortingConfig,

    /// Dryers
    pub drying: DryingConfig,

    /// Shelling lines
    pub shelling: ShellingConfig,

    /// Weekday of simulated day 0
    pub start_weekday: Weekday,

    /// Weekdays on which no trucks arrive (the plant keeps processing)
    pub non_operating_weekdays: Vec<Weekday>,

    /// Output format for the final report
    pub output_format: OutputFormat,

    /// Output path for the final report
    pub output: Option<String>,

    /// Output path for the JSONL event log
    pub event_log: Option<String>,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),

    /// A CLI value could not be interpreted
    #[error("Invalid command line value: {0}")]
    InvalidArgument(String),
}

/// Validation errors for simulation configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    /// Days count is invalid
    #[error("Days count must be greater than 0, got {0}")]
    InvalidDaysCount(usize),

    /// A value that must be strictly positive is not
    #[error("{field} must be greater than 0, got {value}")]
    NotPositive {
        /// Name of the offending field
        field: String,
        /// The invalid value
        value: f64,
    },

    /// A count that must be at least one is zero
    #[error("{0} must be at least 1")]
    EmptyPool(String),

    /// A min/max pair is inverted or out of bounds
    #[error("Invalid range for {field}: min ({min}) must be <= max ({max})")]
    InvalidRange {
        /// Name of the range
        field: String,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Percentage value is out of range
    #[error("Invalid fraction for {field}: {value} (must be between 0.0 and 1.0)")]
    InvalidFraction {
        /// Name of the field with invalid fraction
        field: String,
        /// The invalid value
        value: f64,
    },

    /// Shift longer than a day
    #[error("Shift length must be within (0, 24] hours, got {0}")]
    InvalidShift(f64),

    /// Daily hybrid count exceeds the catalogue
    #[error("Daily hybrid range {min}-{max} does not fit a catalogue of {catalogue} types")]
    InvalidHybridRange {
        /// Minimum per day
        min: u32,
        /// Maximum per day
        max: u32,
        /// Catalogue size
        catalogue: u32,
    },

    /// A GMO class can arrive but has nowhere to be dried or shelled
    #[error("{class} material can arrive but no {resource} serves it")]
    MissingGmoCapacity {
        /// GMO class without capacity
        class: GmoClass,
        /// Which resource is missing
        resource: String,
    },

    /// Every weekday is marked non-operating
    #[error("At least one weekday must be operating")]
    NoOperatingDays,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 13,
            seed: None,
            arrivals: ArrivalConfig::default(),
            unloading: UnloadingConfig::default(),
            sorting: SortingConfig::default(),
            drying: DryingConfig::default(),
            shelling: ShellingConfig::default(),
            start_weekday: Weekday::Mon,
            non_operating_weekdays: vec![Weekday::Sun],
            output_format: OutputFormat::Text,
            output: None,
            event_log: None,
        }
    }
}

impl SimulationConfig {
    /// Create a new configuration from command line arguments and optional config file
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::from_cli_args(args)
    }

    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut config = Self::default();

        // Load from config file if specified
        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // Override with command line arguments (CLI takes precedence)
        Self::apply_cli_overrides(&mut config, args)?;

        Ok(config)
    }

    /// Load configuration from a JSON file
    ///
    /// Keys missing from the file keep their default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) -> Result<(), ConfigError> {
        if let Some(value) = args.days {
            config.days = value;
        }
        if let Some(value) = args.seed {
            config.seed = Some(value);
        }
        if let Some(value) = args.arrival_rate {
            config.arrivals.rate = value;
        }
        if let Some(value) = args.queue_patience_hours {
            config.unloading.patience_hours = value;
        }
        if let Some(value) = args.starvation_fraction {
            config.unloading.starvation_fraction = value;
        }
        if let Some(value) = args.unload_lines {
            config.unloading.line_count = value;
        }
        if args.unload_requires_free_sorter {
            config.unloading.requires_free_sorter = true;
        }
        if let Some(value) = args.module_closure_hours {
            config.drying.module_closure_hours = value;
        }
        if let Some(value) = args.output_format {
            config.output_format = value.parse().map_err(ConfigError::InvalidArgument)?;
        }
        if let Some(value) = args.output {
            config.output = Some(value);
        }
        if let Some(value) = args.event_log {
            config.event_log = Some(value);
        }

        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.days == 0 {
            return Err(ConfigValidationError::InvalidDaysCount(self.days));
        }

        self.validate_arrivals()?;
        self.validate_resources()?;

        for class in [GmoClass::Gmo, GmoClass::NonGmo] {
            let arrives = match class {
                GmoClass::Gmo => self.arrivals.gmo_probability > 0.0,
                GmoClass::NonGmo => self.arrivals.gmo_probability < 1.0,
            };
            if !arrives {
                continue;
            }
            if !self.drying.dryers.iter().any(|dryer| dryer.gmo == class) {
                return Err(ConfigValidationError::MissingGmoCapacity {
                    class,
                    resource: "dryer".to_string(),
                });
            }
            if !self.shelling.lines.contains(&class) {
                return Err(ConfigValidationError::MissingGmoCapacity {
                    class,
                    resource: "shelling line".to_string(),
                });
            }
        }

        let mut non_operating = self.non_operating_weekdays.clone();
        non_operating.sort_by_key(|day| day.num_days_from_monday());
        non_operating.dedup();
        if non_operating.len() >= 7 {
            return Err(ConfigValidationError::NoOperatingDays);
        }

        Ok(())
    }

    fn validate_arrivals(&self) -> Result<(), ConfigValidationError> {
        let arrivals = &self.arrivals;
        if !(arrivals.shift_hours > 0.0 && arrivals.shift_hours <= calendar::HOURS_PER_DAY) {
            return Err(ConfigValidationError::InvalidShift(arrivals.shift_hours));
        }

        validate_positive("arrivals.rate", arrivals.rate)?;
        validate_positive("arrivals.load.low", arrivals.load.low)?;
        validate_range("arrivals.load", arrivals.load)?;

        validate_fraction("arrivals.humidity.low", arrivals.humidity.low)?;
        validate_fraction("arrivals.humidity.high", arrivals.humidity.high)?;
        validate_range("arrivals.humidity", arrivals.humidity)?;

        if arrivals.min_daily_hybrids == 0
            || arrivals.min_daily_hybrids > arrivals.max_daily_hybrids
            || arrivals.max_daily_hybrids > arrivals.hybrid_type_count
        {
            return Err(ConfigValidationError::InvalidHybridRange {
                min: arrivals.min_daily_hybrids,
                max: arrivals.max_daily_hybrids,
                catalogue: arrivals.hybrid_type_count,
            });
        }

        validate_fraction("arrivals.gmo_probability", arrivals.gmo_probability)
    }

    fn validate_resources(&self) -> Result<(), ConfigValidationError> {
        let unloading = &self.unloading;
        if unloading.line_count == 0 {
            return Err(ConfigValidationError::EmptyPool("unloading.line_count".to_string()));
        }
        validate_positive("unloading.rate", unloading.rate)?;
        validate_positive("unloading.patience_hours", unloading.patience_hours)?;
        validate_positive("unloading.starvation_fraction", unloading.starvation_fraction)?;
        validate_fraction("unloading.starvation_fraction", unloading.starvation_fraction)?;
        let cleaning = unloading.cleaning;
        if cleaning.low < 0.0 || !(cleaning.low <= cleaning.mode && cleaning.mode <= cleaning.high) {
            return Err(ConfigValidationError::InvalidRange {
                field: "unloading.cleaning".to_string(),
                min: cleaning.low,
                max: cleaning.high,
            });
        }

        let sorting = &self.sorting;
        if sorting.line_count() == 0 {
            return Err(ConfigValidationError::EmptyPool("sorting lines".to_string()));
        }
        if sorting.automatic_lines > 0 {
            validate_positive("sorting.automatic_rate", sorting.automatic_rate)?;
        }
        if sorting.manual_lines > 0 {
            validate_positive("sorting.manual_rate", sorting.manual_rate)?;
        }

        let drying = &self.drying;
        if drying.dryers.is_empty() {
            return Err(ConfigValidationError::EmptyPool("drying.dryers".to_string()));
        }
        for (index, dryer) in drying.dryers.iter().enumerate() {
            if dryer.modules == 0 {
                return Err(ConfigValidationError::EmptyPool(format!("drying.dryers[{}].modules", index)));
            }
            validate_positive(&format!("drying.dryers[{}].module_capacity", index), dryer.module_capacity)?;
        }
        validate_positive("drying.rate", drying.rate)?;
        validate_fraction("drying.target_humidity", drying.target_humidity)?;
        validate_positive("drying.module_closure_hours", drying.module_closure_hours)?;

        let shelling = &self.shelling;
        if shelling.lines.is_empty() {
            return Err(ConfigValidationError::EmptyPool("shelling.lines".to_string()));
        }
        validate_positive("shelling.rate", shelling.rate)?;
        validate_range("shelling.cleaning", shelling.cleaning)?;
        if shelling.cleaning.low < 0.0 {
            return Err(ConfigValidationError::InvalidRange {
                field: "shelling.cleaning".to_string(),
                min: shelling.cleaning.low,
                max: shelling.cleaning.high,
            });
        }

        Ok(())
    }

    /// Simulation horizon in hours
    pub fn horizon_hours(&self) -> f64 {
        self.days as f64 * calendar::HOURS_PER_DAY
    }
}

fn validate_positive(field: &str, value: f64) -> Result<(), ConfigValidationError> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(ConfigValidationError::NotPositive { field: field.to_string(), value });
    }
    Ok(())
}

/// Helper to validate fraction values
fn validate_fraction(field: &str, value: f64) -> Result<(), ConfigValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigValidationError::InvalidFraction { field: field.to_string(), value });
    }
    Ok(())
}

fn validate_range(field: &str, range: UniformRange) -> Result<(), ConfigValidationError> {
    if !(range.low <= range.high) {
        return Err(ConfigValidationError::InvalidRange {
            field: field.to_string(),
            min: range.low,
            max: range.high,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs::try_parse_from(["test"]).unwrap()
    }

    #[test]
    fn test_simulation_config_default() {
        let config = SimulationConfig::default();

        assert_eq!(config.days, 13);
        assert_eq!(config.unloading.line_count, 4);
        assert_eq!(config.sorting.line_count(), 4);
        assert_eq!(config.drying.dryers.len(), 5);
        assert_eq!(config.drying.total_modules(), 17);
        assert_eq!(config.shelling.lines.len(), 2);
        assert_eq!(config.start_weekday, Weekday::Mon);
        assert_eq!(config.non_operating_weekdays, vec![Weekday::Sun]);
        assert!((config.arrivals.rate - 36.0 / 14.0).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_horizon_and_threshold() {
        let config = SimulationConfig { days: 2, ..Default::default() };
        assert_eq!(config.horizon_hours(), 48.0);
        assert!((config.unloading.starvation_threshold_hours() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::try_parse_from([
            "test",
            "--days",
            "3",
            "--seed",
            "7",
            "--unload-lines",
            "6",
            "--unload-requires-free-sorter",
            "--output-format",
            "json",
        ])
        .unwrap();

        let config = SimulationConfig::from_cli_args(args).unwrap();
        assert_eq!(config.days, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.unloading.line_count, 6);
        assert!(config.unloading.requires_free_sorter);
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_output_format_is_rejected() {
        let mut args = empty_args();
        args.output_format = Some("xml".to_string());
        let result = SimulationConfig::from_cli_args(args);
        assert!(matches!(result, Err(ConfigError::InvalidArgument(_))));
    }

    #[test]
    fn test_validation_days() {
        let config = SimulationConfig { days: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidDaysCount(0))));
    }

    #[test]
    fn test_validation_load_range() {
        let mut config = SimulationConfig::default();
        config.arrivals.load = UniformRange::new(30.0, 20.0);
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidRange { .. })));
    }

    #[test]
    fn test_validation_hybrid_range() {
        let mut config = SimulationConfig::default();
        config.arrivals.max_daily_hybrids = 200;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidHybridRange { .. })));

        let mut config = SimulationConfig::default();
        config.arrivals.min_daily_hybrids = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_fractions() {
        let mut config = SimulationConfig::default();
        config.arrivals.gmo_probability = 1.5;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidFraction { .. })));

        let mut config = SimulationConfig::default();
        config.unloading.starvation_fraction = 0.0;
        assert!(matches!(config.validate(), Err(ConfigValidationError::NotPositive { .. })));
    }

    #[test]
    fn test_validation_empty_pools() {
        let mut config = SimulationConfig::default();
        config.unloading.line_count = 0;
        assert!(matches!(config.validate(), Err(ConfigValidationError::EmptyPool(_))));

        let config = SimulationConfig {
            sorting: SortingConfig { automatic_lines: 0, manual_lines: 0, ..Default::default() },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigValidationError::EmptyPool(_))));

        let mut config = SimulationConfig::default();
        config.drying.dryers.clear();
        assert!(matches!(config.validate(), Err(ConfigValidationError::EmptyPool(_))));
    }

    #[test]
    fn test_validation_missing_gmo_capacity() {
        let mut config = SimulationConfig::default();
        config.shelling.lines = vec![GmoClass::NonGmo];
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::MissingGmoCapacity { class: GmoClass::Gmo, .. })
        ));

        // No GMO arrivals means no GMO resources are required
        config.arrivals.gmo_probability = 0.0;
        config.drying.dryers = vec![DryerSpec::new(GmoClass::NonGmo, 2, 100.0)];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_no_operating_days() {
        let config = SimulationConfig {
            non_operating_weekdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigValidationError::NoOperatingDays)));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = SimulationConfig { seed: Some(11), ..Default::default() };
        let json = config.print_json().unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_partial_config_merges_defaults() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{
                "days": 4,
                "shelling": { "rate": 30.0 },
                "non_operating_weekdays": ["Sat", "Sun"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.days, 4);
        assert_eq!(config.shelling.rate, 30.0);
        assert_eq!(config.shelling.lines, ShellingConfig::default().lines);
        assert_eq!(config.non_operating_weekdays, vec![Weekday::Sat, Weekday::Sun]);
        assert_eq!(config.unloading, UnloadingConfig::default());
    }
}
