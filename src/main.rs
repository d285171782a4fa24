// Grain Plant Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/grain-plant-simulator
// ```
//
// Or with custom configuration:
//
// ```console
// $ ./target/release/grain-plant-simulator --days 30 --seed 42 --output-format json --verbose
// ```

use anyhow::{Context, Result};
use clap::Parser;
use grain_plant_simulator::simulation::{
    JsonReport, LoggingConfig, LoggingGuard, Plant, StatisticsSink, TextReport,
};
use grain_plant_simulator::types::config::CliArgs;
use grain_plant_simulator::types::{OutputFormat, SimulationConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process;
use tracing::{error, info};

fn main() {
    // Parse CLI arguments first to check for special flags
    let args = CliArgs::parse();

    // Handle special CLI flags that don't require full initialization
    if args.print_config {
        match SimulationConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    // Initialize logging based on CLI flags; the guard keeps file logging alive
    let _logging_guard = match init_logging(&args) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    info!("Starting Grain Plant Simulator");

    // Load configuration from CLI arguments and optional config file
    let config = match SimulationConfig::from_cli_args(args.clone()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("Configuration validation failed: {}", e);
        process::exit(1);
    }

    info!("Configuration loaded and validated successfully");

    // Handle dry run mode
    if args.dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config);
        return;
    }

    print_startup_banner(&config);

    if let Err(e) = run_simulation(config) {
        error!("Simulation failed: {:#}", e);
        eprintln!("Simulation failed: {:#}", e);
        process::exit(1);
    }

    info!("Grain Plant Simulator completed successfully");
}

fn init_logging(args: &CliArgs) -> Result<LoggingGuard, Box<dyn std::error::Error + Send + Sync>> {
    let mut logging = LoggingConfig::from_flags(args.verbose, args.debug);
    if let Some(directory) = &args.log_dir {
        logging = logging.with_file_logging(directory.clone());
    }
    logging.init()
}

/// Build the plant, run it and publish the report
fn run_simulation(config: SimulationConfig) -> Result<()> {
    let mut plant = Plant::from_config(config.clone()).context("Failed to initialize the plant")?;

    if let Some(path) = &config.event_log {
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log file '{}'", path))?;
        plant = plant.with_event_log(BufWriter::new(file));
        eprintln!("Writing event log to {}", path);
    }

    eprintln!("Simulating {} days...", config.days);
    plant.simulate().context("Simulation aborted")?;
    eprintln!("Simulation completed!");

    let output: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create report file '{}'", path))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let statistics = plant.statistics();
    match config.output_format {
        OutputFormat::Text => TextReport::new(output).publish(statistics),
        OutputFormat::Json => JsonReport::new(output).publish(statistics),
    }
    .context("Failed to write the statistics report")?;

    if let Some(path) = &config.output {
        info!("Report written to: {}", path);
        eprintln!("Report written to: {}", path);
    }
    info!("{}", statistics.generate_compact_summary());
    Ok(())
}

/// Print startup banner and configuration summary
fn print_startup_banner(config: &SimulationConfig) {
    eprintln!("Grain Plant Simulator");
    eprintln!("=====================");
    eprintln!("Discrete-event simulation of a grain receiving, drying and shelling plant");
    eprintln!();

    print_configuration_summary(config);
}

/// Print configuration summary
fn print_configuration_summary(config: &SimulationConfig) {
    eprintln!("Configuration:");
    eprintln!("  Days: {} (starting {}, closed {:?})", config.days, config.start_weekday, config.non_operating_weekdays);
    let arrivals = &config.arrivals;
    eprintln!("  Shift: {:.1} h at {:.2} trucks/h", arrivals.shift_hours, arrivals.rate);
    eprintln!("  Truck Load: {:.1} - {:.1} t", arrivals.load.low, arrivals.load.high);
    eprintln!(
        "  Humidity: {:.0}% - {:.0}%",
        arrivals.humidity.low * 100.0,
        arrivals.humidity.high * 100.0
    );
    eprintln!(
        "  Hybrid Types: {} - {} per day out of {}",
        arrivals.min_daily_hybrids, arrivals.max_daily_hybrids, arrivals.hybrid_type_count
    );
    eprintln!("  GMO Probability: {:.1}%", arrivals.gmo_probability * 100.0);
    eprintln!(
        "  Queue Patience: {:.1} h (starvation after {:.1} h)",
        config.unloading.patience_hours,
        config.unloading.starvation_threshold_hours()
    );
    eprintln!("  Unloading Lines: {} at {:.1} t/h", config.unloading.line_count, config.unloading.rate);
    eprintln!(
        "  Sorting Lines: {} automatic at {:.1} t/h, {} manual at {:.1} t/h",
        config.sorting.automatic_lines,
        config.sorting.automatic_rate,
        config.sorting.manual_lines,
        config.sorting.manual_rate
    );
    eprintln!(
        "  Dryers: {} with {} modules, closure after {:.1} h",
        config.drying.dryers.len(),
        config.drying.total_modules(),
        config.drying.module_closure_hours
    );
    eprintln!("  Shelling Lines: {} at {:.1} t/h", config.shelling.lines.len(), config.shelling.rate);
    eprintln!("  Output Format: {}", config.output_format);
    if let Some(seed) = config.seed {
        eprintln!("  Random Seed: {}", seed);
    }
    eprintln!();
}
