mod args;
mod logging;
mod runner;

use std::process::ExitCode;

use clap::Parser;

use crate::args::{Args, StressConfig};

fn main() -> ExitCode {
    let config = match StressConfig::from_args(Args::parse()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = logging::init(config.log.as_deref()) {
        eprintln!("failed to open log file: {err}");
        return ExitCode::FAILURE;
    }

    let config_json = serde_json::to_string_pretty(&config).unwrap_or_else(|_| "{}".to_string());
    tracing::info!("config: {}", config_json);

    match runner::run(&config) {
        Ok(outcome) if outcome.matches(&config) => {
            tracing::info!(
                "ok: {} updates and {} callbacks in {:?}",
                outcome.updates,
                outcome.callbacks,
                outcome.elapsed
            );
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            tracing::error!(
                "mismatch: counter {} (expected {}), callbacks {} (expected {})",
                outcome.updates,
                config.expected_updates(),
                outcome.callbacks,
                config.expected_callbacks()
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!("stress run failed: {err}");
            ExitCode::FAILURE
        }
    }
}
