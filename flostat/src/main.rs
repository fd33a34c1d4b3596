/// CLI entry point for the two-gauge streamflow comparison.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use flostat::config;
use flostat::logging::{self, LogLevel, Stage};
use flostat::report;

#[derive(Parser)]
#[command(name = "flostat")]
#[command(about = "Compare daily streamflow statistics for two USGS gauges", long_about = None)]
struct Cli {
    /// TOML analysis configuration (defaults to $FLOSTAT_CONFIG, then built-in)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for figure data and the run summary
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Minimum level to log: debug, info, warn, error
    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    /// Also append log lines to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<String>,

    /// Prefix console lines with timestamps
    #[arg(long, default_value_t = false)]
    timestamps: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logger(cli.log_level, cli.log_file.as_deref(), cli.timestamps);

    let mut config = match config::from_env(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            logging::error(Stage::System, None, &e.to_string());
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    logging::info(
        Stage::System,
        None,
        &format!(
            "Analyzing {} gauges, {} to {}",
            config.gauges.len(),
            config.window.start,
            config.window.end
        ),
    );

    match report::run(&config) {
        Ok(summary) => {
            for gauge in &summary.gauges {
                logging::info(
                    Stage::Report,
                    Some(&gauge.key),
                    &format!(
                        "{}: {} days, {} missing, {} months",
                        gauge.name, gauge.clipped_records, gauge.clipped_missing, gauge.months
                    ),
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            logging::error(Stage::System, None, &format!("Run failed: {}", e));
            ExitCode::FAILURE
        }
    }
}
