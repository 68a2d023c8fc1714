mod altitude;
mod source;
mod web;

use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::altitude::{
    parse_timestamp, GridLimits, OrbitalElements, SeriesAssembler, Sgp4Propagator, TimeWindow,
};
use crate::web::api::altitude::AltitudeResponse;
use crate::web::Config;

#[derive(Parser)]
#[command(name = "sat-altitude")]
#[command(about = "Satellite altitude time series from two-line element sets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve {
        #[arg(long, default_value = "config.yaml")]
        config: String,
    },
    /// Validate a TLE file
    Validate { tle: String },
    /// Compute an altitude series from a TLE file and print it as JSON
    Series {
        tle: String,
        /// Start time, YYYY-MM-DDTHH:MM:SSZ
        #[arg(long)]
        start: String,
        /// End time, YYYY-MM-DDTHH:MM:SSZ
        #[arg(long)]
        end: String,
        /// Sampling step, e.g. "60s" or "5m"
        #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
        step: Duration,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config),
        Commands::Validate { tle } => validate(&tle),
        Commands::Series {
            tle,
            start,
            end,
            step,
        } => series(&tle, &start, &end, step),
    }
}

fn serve(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_elements(path: &str) -> Result<(Option<String>, OrbitalElements), String> {
    let tle = source::read_tle_file(Path::new(path)).map_err(|e| e.to_string())?;
    let elements =
        OrbitalElements::from_tle(&tle.line1, &tle.line2).map_err(|e| e.to_string())?;
    Ok((tle.name, elements))
}

fn validate(path: &str) -> ExitCode {
    match load_elements(path) {
        Ok((name, elements)) => {
            println!("Element set is valid");
            if let Some(name) = name {
                println!("  Name: {}", name);
            }
            println!("  NORAD ID: {}", elements.catalog_id);
            println!("  Designator: {}", elements.international_designator);
            println!("  Epoch: {} ({})", elements.epoch, elements.epoch_text);
            println!("  Mean motion: {} rev/day", elements.mean_motion);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Invalid TLE: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn series(path: &str, start: &str, end: &str, step: Duration) -> ExitCode {
    match compute_series(path, start, end, step) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn compute_series(path: &str, start: &str, end: &str, step: Duration) -> Result<String, String> {
    if step.subsec_nanos() != 0 {
        return Err(format!(
            "step must be a whole number of seconds, got {}",
            humantime::format_duration(step)
        ));
    }
    let step_seconds = i64::try_from(step.as_secs()).map_err(|e| e.to_string())?;

    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;
    let window =
        TimeWindow::new(start, end, step_seconds, &GridLimits::default()).map_err(|e| e.to_string())?;

    let (_, elements) = load_elements(path)?;
    let assembler = SeriesAssembler::new(Arc::new(Sgp4Propagator::new()));
    let series = assembler
        .build(&elements, &window)
        .map_err(|e| e.to_string())?;

    serde_json::to_string_pretty(&AltitudeResponse::new(series, path)).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const LEO: &str = "LEO TEST
1 25544U 98067A   24001.50000000  .00001000  00000-0  20000-4 0  9999
2 25544  51.6400 200.0000 0006000  50.0000 310.0000 15.50000000100018
";

    fn write_tle(content: &str) -> String {
        let path = std::env::temp_dir().join(format!("sat-altitude-{}.tle", uuid::Uuid::new_v4()));
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn series_prints_api_shaped_json() {
        let path = write_tle(LEO);
        let json = compute_series(
            &path,
            "2024-01-01T12:00:00Z",
            "2024-01-01T12:10:00Z",
            Duration::from_secs(60),
        )
        .unwrap();
        fs::remove_file(&path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["norad_id"], 25544);
        assert_eq!(value["step_seconds"], 60);
        assert_eq!(value["points"].as_array().unwrap().len(), 11);
    }

    #[test]
    fn series_rejects_fractional_step() {
        let err = compute_series(
            "unused.tle",
            "2024-01-01T12:00:00Z",
            "2024-01-01T12:10:00Z",
            Duration::from_millis(1500),
        )
        .unwrap_err();
        assert!(err.contains("whole number of seconds"), "{}", err);
    }

    #[test]
    fn load_elements_keeps_the_name() {
        let path = write_tle(LEO);
        let (name, elements) = load_elements(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(name.as_deref(), Some("LEO TEST"));
        assert_eq!(elements.catalog_id, 25544);
    }
}
