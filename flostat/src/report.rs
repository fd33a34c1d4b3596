/// Two-gauge comparison run
///
/// Loads and clips each configured gauge, derives its monthly statistics and
/// seasonal profile, then writes the data series behind the six comparison
/// figures as CSV files plus a JSON run summary.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::{climatology, clip, monthly, peaks};
use crate::config::{AnalysisConfig, ConfigError, DateWindow, GaugeConfig};
use crate::ingest::metrics::{self, MetricsTable};
use crate::ingest::usgs_daily;
use crate::logging::{self, Stage};
use crate::model::{ClimatologyRow, DailySeries, LoadError, MonthlyStats};

/// Annual metrics columns read from the metrics file.
pub const COL_COEFF_VAR: &str = "Coeff Var";
pub const COL_TQMEAN: &str = "Tqmean";
pub const COL_RB_INDEX: &str = "R-B Index";
pub const COL_PEAK_FLOW: &str = "Peak Flow";

pub const FIG_DAILY_FLOW: &str = "daily_flow_recent.csv";
pub const FIG_COEFF_VAR: &str = "annual_coeff_var.csv";
pub const FIG_TQMEAN: &str = "annual_tqmean.csv";
pub const FIG_RB_INDEX: &str = "annual_rb_index.csv";
pub const FIG_MONTHLY_FLOW: &str = "monthly_average_flow.csv";
pub const FIG_PEAK_EXCEEDANCE: &str = "peak_flow_exceedance.csv";
pub const SUMMARY_FILE: &str = "summary.json";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ReportError {
    Load(LoadError),
    Config(ConfigError),
    Write { path: String, message: String },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Load(e) => write!(f, "{}", e),
            ReportError::Config(e) => write!(f, "{}", e),
            ReportError::Write { path, message } => {
                write!(f, "Failed to write {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for ReportError {}

impl From<LoadError> for ReportError {
    fn from(e: LoadError) -> Self {
        ReportError::Load(e)
    }
}

impl From<ConfigError> for ReportError {
    fn from(e: ConfigError) -> Self {
        ReportError::Config(e)
    }
}

// ============================================================================
// Per-gauge analysis
// ============================================================================

/// Everything derived from one gauge's discharge file.
#[derive(Debug, Clone)]
pub struct GaugeAnalysis {
    pub gauge: GaugeConfig,
    pub loaded_records: usize,
    pub loaded_missing: usize,
    pub negatives_corrected: usize,
    /// Series clipped to the analysis window.
    pub series: DailySeries,
    pub clipped_missing: usize,
    pub monthly: Vec<MonthlyStats>,
    pub climatology: [ClimatologyRow; 12],
}

pub fn analyze_gauge(gauge: &GaugeConfig, window: DateWindow) -> Result<GaugeAnalysis, LoadError> {
    let loaded = usgs_daily::load_daily_series(&gauge.discharge_file)
        .inspect_err(|e| logging::log_gauge_failure(&gauge.key, "Reading discharge file", e))?;

    logging::debug(
        Stage::Load,
        Some(&gauge.key),
        &format!(
            "{} daily records from {}",
            loaded.series.len(),
            gauge.discharge_file.display()
        ),
    );

    let (series, clipped_missing) = clip::clip_series(&loaded.series, window.start, window.end);
    logging::log_missing_summary(
        &gauge.key,
        loaded.missing,
        clipped_missing,
        loaded.negatives_corrected,
    );
    if series.is_empty() {
        logging::warn(
            Stage::Clip,
            Some(&gauge.key),
            &format!("No records between {} and {}", window.start, window.end),
        );
    }

    let monthly = monthly::monthly_statistics(&series);
    let climatology = climatology::monthly_averages(&monthly);
    logging::debug(
        Stage::Aggregate,
        Some(&gauge.key),
        &format!("{} monthly rows", monthly.len()),
    );

    Ok(GaugeAnalysis {
        gauge: gauge.clone(),
        loaded_records: loaded.series.len(),
        loaded_missing: loaded.missing,
        negatives_corrected: loaded.negatives_corrected,
        series,
        clipped_missing,
        monthly,
        climatology,
    })
}

// ============================================================================
// Figure data rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyFlowRow {
    pub date: NaiveDate,
    pub gauge: String,
    pub discharge: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualMetricRow {
    pub date: NaiveDate,
    pub gauge: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFlowRow {
    pub month: u32,
    pub gauge: String,
    pub mean_flow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakRow {
    pub gauge: String,
    pub date: NaiveDate,
    pub peak_flow: f64,
    pub rank: f64,
    pub exceedance_probability: f64,
}

/// Daily flow of every gauge over `recent`.
pub fn daily_flow_rows(analyses: &[GaugeAnalysis], recent: DateWindow) -> Vec<DailyFlowRow> {
    analyses
        .iter()
        .flat_map(|a| {
            let (clipped, _) = clip::clip_series(&a.series, recent.start, recent.end);
            clipped
                .records()
                .iter()
                .map(|r| DailyFlowRow {
                    date: r.date,
                    gauge: a.gauge.key.clone(),
                    discharge: r.discharge,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// One annual metrics column per gauge, rows in file order.
pub fn annual_metric_rows(
    per_gauge: &[(String, MetricsTable)],
    column: &str,
) -> Result<Vec<AnnualMetricRow>, LoadError> {
    let mut rows = Vec::new();
    for (key, table) in per_gauge {
        for (date, value) in table.column(column)? {
            rows.push(AnnualMetricRow {
                date,
                gauge: key.clone(),
                value,
            });
        }
    }
    Ok(rows)
}

pub fn monthly_flow_rows(analyses: &[GaugeAnalysis]) -> Vec<MonthlyFlowRow> {
    analyses
        .iter()
        .flat_map(|a| {
            a.climatology.iter().map(|c| MonthlyFlowRow {
                month: c.month,
                gauge: a.gauge.key.clone(),
                mean_flow: c.mean_flow,
            })
        })
        .collect()
}

pub fn peak_rows(per_gauge: &[(String, MetricsTable)]) -> Result<Vec<PeakRow>, LoadError> {
    let mut rows = Vec::new();
    for (key, table) in per_gauge {
        let annual_peaks = table.column(COL_PEAK_FLOW)?;
        rows.extend(
            peaks::exceedance_probabilities(&annual_peaks)
                .into_iter()
                .map(|p| PeakRow {
                    gauge: key.clone(),
                    date: p.date,
                    peak_flow: p.peak_flow,
                    rank: p.rank,
                    exceedance_probability: p.exceedance_probability,
                }),
        );
    }
    Ok(rows)
}

// ============================================================================
// Run summary
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GaugeSummary {
    pub key: String,
    pub name: String,
    pub loaded_records: usize,
    pub loaded_missing: usize,
    pub negatives_corrected: usize,
    pub clipped_records: usize,
    pub clipped_missing: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub months: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub window: DateWindow,
    pub gauges: Vec<GaugeSummary>,
    pub figures: Vec<String>,
}

impl From<&GaugeAnalysis> for GaugeSummary {
    fn from(a: &GaugeAnalysis) -> Self {
        GaugeSummary {
            key: a.gauge.key.clone(),
            name: a.gauge.name.clone(),
            loaded_records: a.loaded_records,
            loaded_missing: a.loaded_missing,
            negatives_corrected: a.negatives_corrected,
            clipped_records: a.series.len(),
            clipped_missing: a.clipped_missing,
            first_date: a.series.first_date(),
            last_date: a.series.last_date(),
            months: a.monthly.len(),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

pub fn run(config: &AnalysisConfig) -> Result<RunSummary, ReportError> {
    config.validate()?;

    let mut analyses = Vec::with_capacity(config.gauges.len());
    for gauge in &config.gauges {
        analyses.push(analyze_gauge(gauge, config.window)?);
    }

    let metrics_table = metrics::load_metrics(&config.metrics_file).inspect_err(|e| {
        logging::error(Stage::Metrics, None, &format!("Reading metrics file failed: {}", e))
    })?;
    let mut per_gauge = Vec::with_capacity(config.gauges.len());
    for gauge in &config.gauges {
        let table = metrics_table.filter_station(&gauge.station)?;
        if table.is_empty() {
            logging::warn(
                Stage::Metrics,
                Some(&gauge.key),
                &format!("No metrics rows for station '{}'", gauge.station),
            );
        }
        per_gauge.push((gauge.key.clone(), table));
    }

    fs::create_dir_all(&config.output_dir).map_err(|e| write_error(&config.output_dir, e))?;
    let out = |name: &str| config.output_dir.join(name);

    let mut figures = Vec::new();
    let mut record = |path: PathBuf| figures.push(path.display().to_string());

    let p = out(FIG_DAILY_FLOW);
    write_csv(&p, &daily_flow_rows(&analyses, config.recent_window))?;
    record(p);

    for (name, column) in [
        (FIG_COEFF_VAR, COL_COEFF_VAR),
        (FIG_TQMEAN, COL_TQMEAN),
        (FIG_RB_INDEX, COL_RB_INDEX),
    ] {
        let p = out(name);
        write_csv(&p, &annual_metric_rows(&per_gauge, column)?)?;
        record(p);
    }

    let p = out(FIG_MONTHLY_FLOW);
    write_csv(&p, &monthly_flow_rows(&analyses))?;
    record(p);

    let p = out(FIG_PEAK_EXCEEDANCE);
    write_csv(&p, &peak_rows(&per_gauge)?)?;
    record(p);

    let summary = RunSummary {
        generated_at: chrono::Utc::now().to_rfc3339(),
        window: config.window,
        gauges: analyses.iter().map(GaugeSummary::from).collect(),
        figures,
    };

    let summary_path = out(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(&summary).map_err(|e| write_error(&summary_path, e))?;
    fs::write(&summary_path, json).map_err(|e| write_error(&summary_path, e))?;

    logging::log_run_summary(config.gauges.len(), analyses.len(), summary.figures.len());
    Ok(summary)
}

/// Write serializable rows as CSV with a header line.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| write_error(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| write_error(path, e))?;
    }
    writer.flush().map_err(|e| write_error(path, e))?;

    logging::debug(
        Stage::Report,
        None,
        &format!("{} rows -> {}", rows.len(), path.display()),
    );
    Ok(())
}

fn write_error(path: &Path, err: impl fmt::Display) -> ReportError {
    ReportError::Write {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
