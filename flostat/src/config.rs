/// Analysis configuration.
///
/// Loaded from a TOML file, or built from defaults that reproduce the
/// Tippecanoe River / Wildcat Creek comparison over water years 1970-2019.
/// A `.env` file may point at the config (`FLOSTAT_CONFIG`) and override
/// the output directory (`FLOSTAT_OUTPUT_DIR`).
///
/// Example:
///
/// ```toml
/// metrics_file = "Annual_Metrics.csv"
/// output_dir = "figures"
///
/// [window]
/// start = "1969-10-01"
/// end = "2019-09-30"
///
/// [recent_window]
/// start = "2014-10-01"
/// end = "2019-09-30"
///
/// [[gauges]]
/// key = "Tippe"
/// name = "Tippecanoe River"
/// station = "Tippe"
/// discharge_file = "TippecanoeRiver_Discharge_03331500_19431001-20200315.txt"
/// ```

use std::collections::HashSet;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "FLOSTAT_CONFIG";
pub const OUTPUT_DIR_ENV: &str = "FLOSTAT_OUTPUT_DIR";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// One gauge to analyze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeConfig {
    /// Short key used in logs and output rows.
    pub key: String,
    /// Full river name for figure legends.
    pub name: String,
    /// Value of the `Station` column in the metrics file.
    pub station: String,
    pub discharge_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub window: DateWindow,
    /// Sub-window shown in the daily flow figure.
    pub recent_window: DateWindow,
    pub metrics_file: PathBuf,
    pub output_dir: PathBuf,
    pub gauges: Vec<GaugeConfig>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Cannot read config {}: {}", path, message)
            }
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            // 50 water years
            window: DateWindow::new(ymd(1969, 10, 1), ymd(2019, 9, 30)),
            recent_window: DateWindow::new(ymd(2014, 10, 1), ymd(2019, 9, 30)),
            metrics_file: PathBuf::from("Annual_Metrics.csv"),
            output_dir: PathBuf::from("."),
            gauges: vec![
                GaugeConfig {
                    key: "Wildcat".to_string(),
                    name: "Wildcat Creek".to_string(),
                    station: "Wildcat".to_string(),
                    discharge_file: PathBuf::from(
                        "WildcatCreek_Discharge_03335000_19540601-20200315.txt",
                    ),
                },
                GaugeConfig {
                    key: "Tippe".to_string(),
                    name: "Tippecanoe River".to_string(),
                    station: "Tippe".to_string(),
                    discharge_file: PathBuf::from(
                        "TippecanoeRiver_Discharge_03331500_19431001-20200315.txt",
                    ),
                },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gauges.is_empty() {
            return Err(ConfigError::Invalid("at least one gauge is required".to_string()));
        }

        let mut keys = HashSet::new();
        for gauge in &self.gauges {
            if !keys.insert(gauge.key.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate gauge key '{}'", gauge.key)));
            }
        }

        for (label, w) in [("window", &self.window), ("recent_window", &self.recent_window)] {
            if w.start > w.end {
                return Err(ConfigError::Invalid(format!(
                    "{} starts ({}) after it ends ({})",
                    label, w.start, w.end
                )));
            }
        }

        Ok(())
    }
}

pub fn parse_config(text: &str) -> Result<AnalysisConfig, ConfigError> {
    let config: AnalysisConfig =
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AnalysisConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_config(&text)
}

/// Resolve the configuration from the environment (after loading `.env`).
///
/// `explicit` takes precedence over `FLOSTAT_CONFIG`; with neither, the
/// built-in defaults are used.
pub fn from_env(explicit: Option<&Path>) -> Result<AnalysisConfig, ConfigError> {
    dotenv::dotenv().ok();
    resolve(explicit, env::var(CONFIG_ENV).ok(), env::var(OUTPUT_DIR_ENV).ok())
}

/// Pick the config source and apply the output directory override.
pub fn resolve(
    explicit: Option<&Path>,
    config_env: Option<String>,
    output_env: Option<String>,
) -> Result<AnalysisConfig, ConfigError> {
    let mut config = match (explicit, config_env) {
        (Some(path), _) => load_config(path)?,
        (None, Some(path)) => load_config(path)?,
        (None, None) => AnalysisConfig::default(),
    };

    if let Some(dir) = output_env {
        config.output_dir = PathBuf::from(dir);
    }

    Ok(config)
}
