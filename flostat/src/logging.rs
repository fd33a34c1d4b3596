/// Structured logging for the streamflow comparison run
///
/// Tags each line with the processing stage and, where relevant, the gauge
/// key it concerns. Supports console output and an optional append-only
/// log file.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::LoadError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Processing Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Load,
    Clip,
    Aggregate,
    Metrics,
    Report,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Load => write!(f, "LOAD"),
            Stage::Clip => write!(f, "CLIP"),
            Stage::Aggregate => write!(f, "AGG"),
            Stage::Metrics => write!(f, "METRICS"),
            Stage::Report => write!(f, "REPORT"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Input absent; usually a wrong path in the configuration
    Expected,
    /// Input present but unreadable as the documented format
    Unexpected,
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, stage: &Stage, gauge: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let gauge_part = gauge.map(|g| format!(" [{}]", g)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, stage, gauge_part, message)
    }

    fn log(&self, level: LogLevel, stage: &Stage, gauge: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, stage, gauge, message);
        let gauge_part = gauge.map(|g| format!(" [{}]", g)).unwrap_or_default();

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, gauge_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, gauge_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}{}: {}", stage, gauge_part, message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, stage: Stage, gauge: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &stage, gauge, message);
        }
    }
}

pub fn info(stage: Stage, gauge: Option<&str>, message: &str) {
    emit(LogLevel::Info, stage, gauge, message);
}

pub fn warn(stage: Stage, gauge: Option<&str>, message: &str) {
    emit(LogLevel::Warning, stage, gauge, message);
}

pub fn error(stage: Stage, gauge: Option<&str>, message: &str) {
    emit(LogLevel::Error, stage, gauge, message);
}

pub fn debug(stage: Stage, gauge: Option<&str>, message: &str) {
    emit(LogLevel::Debug, stage, gauge, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

pub fn classify_load_failure(err: &LoadError) -> FailureType {
    match err {
        LoadError::Io { .. } => FailureType::Expected,
        LoadError::Malformed { .. } | LoadError::MissingColumn(_) => FailureType::Unexpected,
        LoadError::Empty => FailureType::Unknown,
    }
}

/// Log a per-gauge input failure with automatic classification
pub fn log_gauge_failure(gauge: &str, operation: &str, err: &LoadError) {
    let failure_type = classify_load_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected | FailureType::Unexpected => {
            error(Stage::Load, Some(gauge), &message)
        }
        FailureType::Unknown => warn(Stage::Load, Some(gauge), &message),
    }
}

// ---------------------------------------------------------------------------
// Summary Logging
// ---------------------------------------------------------------------------

/// Log how many missing discharge days survived clipping for one gauge.
pub fn log_missing_summary(gauge: &str, loaded: usize, clipped: usize, corrected: usize) {
    let message = format!(
        "Missing days: {} in file ({} negative corrected), {} in analysis window",
        loaded, corrected, clipped
    );

    if clipped == 0 {
        info(Stage::Clip, Some(gauge), &message);
    } else {
        warn(Stage::Clip, Some(gauge), &message);
    }
}

/// Log the outcome of a full run
pub fn log_run_summary(total: usize, successful: usize, figures_written: usize) {
    let message = format!(
        "Run complete: {}/{} gauges analyzed, {} figure datasets written",
        successful, total, figures_written
    );

    if successful == total {
        info(Stage::Report, None, &message);
    } else if successful == 0 {
        error(Stage::Report, None, &message);
    } else {
        warn(Stage::Report, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_failure_classification() {
        let missing_file = LoadError::Io {
            path: "Wildcat.txt".to_string(),
            message: "No such file or directory".to_string(),
        };
        assert_eq!(classify_load_failure(&missing_file), FailureType::Expected);

        let bad_line = LoadError::Malformed { line: 3, reason: "bad date".to_string() };
        assert_eq!(classify_load_failure(&bad_line), FailureType::Unexpected);

        assert_eq!(classify_load_failure(&LoadError::Empty), FailureType::Unknown);
    }

    #[test]
    fn test_entry_format_includes_stage_and_gauge() {
        let entry = Logger::format_entry(LogLevel::Warning, &Stage::Clip, Some("Tippe"), "3 missing");
        assert!(entry.ends_with("WARN CLIP [Tippe]: 3 missing"));
    }
}
