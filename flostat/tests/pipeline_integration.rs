/// Integration tests for the full load → clip → aggregate → report run
///
/// These tests verify:
/// 1. Discharge files on disk load with sentinel and negative handling
/// 2. Clipping to the analysis window recounts missing days
/// 3. The run writes all six figure datasets plus the JSON summary
/// 4. Fatal input problems surface as errors instead of partial output
///
/// Fixtures are written under the system temp directory; no network or
/// database is needed.
///
/// Run with: cargo test --test pipeline_integration

use std::env;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use flostat::analysis::{climatology, clip, monthly};
use flostat::config::{AnalysisConfig, DateWindow, GaugeConfig};
use flostat::ingest::usgs_daily;
use flostat::model::LoadError;
use flostat::report::{self, ReportError};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("flostat_it_{}", name));
    let _ = fs::remove_dir_all(&dir); // clean up any prior run
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Daily discharge file from `start` for `days` days. Every tenth day is
/// `Eqp`, and the third day is negative.
fn discharge_file(site: &str, start: NaiveDate, days: u64, base: f64) -> String {
    let mut text = String::from(
        "# U.S. Geological Survey\n\
         # retrieved for integration tests\n\
         agency_cd\tsite_no\tdatetime\t01_00060_00003\t01_00060_00003_cd\n\
         5s\t15s\t20d\t14n\t10s\n",
    );
    for i in 0..days {
        let d = start + chrono::Days::new(i);
        let q = if i % 10 == 9 {
            "Eqp".to_string()
        } else if i == 2 {
            "-999".to_string()
        } else {
            format!("{}", base + (i % 7) as f64)
        };
        text.push_str(&format!("USGS\t{}\t{}\t{}\tA\n", site, d, q));
    }
    text
}

const METRICS: &str = "\
Date,site_no,Mean Flow,Peak Flow,Median Flow,Coeff Var,Skew,Tqmean,R-B Index,7Q,3xMedian,Station
1970-09-30,3331500,550.2,4870,400,81.3,1.2,0.31,0.05,90,2,Tippe
1971-09-30,3331500,602.0,5120,410,77.0,1.1,0.33,0.04,95,3,Tippe
1970-09-30,3335000,280.9,9300,150,140.1,2.5,0.22,0.21,10,6,Wildcat
1971-09-30,3335000,301.4,9300,160,133.7,2.4,0.24,0.20,11,7,Wildcat
";

fn write_fixture_config(name: &str) -> AnalysisConfig {
    let dir = scratch_dir(name);
    let tippe = dir.join("tippe.txt");
    let wildcat = dir.join("wildcat.txt");
    fs::write(&tippe, discharge_file("03331500", date(1969, 9, 1), 120, 500.0)).unwrap();
    fs::write(&wildcat, discharge_file("03335000", date(1969, 9, 15), 90, 250.0)).unwrap();
    let metrics = dir.join("Annual_Metrics.csv");
    fs::write(&metrics, METRICS).unwrap();

    AnalysisConfig {
        window: DateWindow::new(date(1969, 10, 1), date(1969, 12, 31)),
        recent_window: DateWindow::new(date(1969, 12, 1), date(1969, 12, 31)),
        metrics_file: metrics,
        output_dir: dir.join("out"),
        gauges: vec![
            GaugeConfig {
                key: "Wildcat".to_string(),
                name: "Wildcat Creek".to_string(),
                station: "Wildcat".to_string(),
                discharge_file: wildcat,
            },
            GaugeConfig {
                key: "Tippe".to_string(),
                name: "Tippecanoe River".to_string(),
                station: "Tippe".to_string(),
                discharge_file: tippe,
            },
        ],
    }
}

// ---------------------------------------------------------------------------
// Stage Tests
// ---------------------------------------------------------------------------

#[test]
fn test_load_then_clip_recounts_missing() {
    let dir = scratch_dir("clip");
    let path = dir.join("tippe.txt");
    fs::write(&path, discharge_file("03331500", date(1969, 9, 1), 120, 500.0)).unwrap();

    let loaded = usgs_daily::load_daily_series(&path).unwrap();
    assert_eq!(loaded.series.len(), 120);
    // 12 Eqp days + 1 corrected negative
    assert_eq!(loaded.missing, 13);
    assert_eq!(loaded.negatives_corrected, 1);

    let (clipped, missing) = clip::clip_series(&loaded.series, date(1969, 10, 1), date(1969, 12, 31));
    assert_eq!(clipped.len(), 90);
    assert!(missing <= loaded.missing);
    assert_eq!(missing, 9);

    let again = clip::clip_series(&clipped, date(1969, 10, 1), date(1969, 12, 31));
    assert_eq!(again, (clipped.clone(), missing));

    let table = monthly::monthly_statistics(&clipped);
    assert_eq!(table.len(), 3);
    let profile = climatology::monthly_averages(&table);
    assert_eq!(profile.len(), 12);
    assert!(profile[0].mean_flow.is_nan());
    assert!(profile[9].mean_flow > 500.0);
}

// ---------------------------------------------------------------------------
// Full Run Tests
// ---------------------------------------------------------------------------

#[test]
fn test_run_writes_all_figure_datasets() {
    let config = write_fixture_config("run");
    let summary = report::run(&config).expect("run should succeed");

    assert_eq!(summary.figures.len(), 6);
    for name in [
        report::FIG_DAILY_FLOW,
        report::FIG_COEFF_VAR,
        report::FIG_TQMEAN,
        report::FIG_RB_INDEX,
        report::FIG_MONTHLY_FLOW,
        report::FIG_PEAK_EXCEEDANCE,
        report::SUMMARY_FILE,
    ] {
        assert!(config.output_dir.join(name).exists(), "{} not written", name);
    }

    let wildcat = &summary.gauges[0];
    assert_eq!(wildcat.key, "Wildcat");
    assert_eq!(wildcat.clipped_records, 74);
    assert_eq!(wildcat.first_date, Some(date(1969, 10, 1)));
    assert_eq!(wildcat.last_date, Some(date(1969, 12, 13)));

    let monthly = fs::read_to_string(config.output_dir.join(report::FIG_MONTHLY_FLOW)).unwrap();
    assert_eq!(monthly.lines().next(), Some("month,gauge,mean_flow"));
    assert_eq!(monthly.lines().count(), 1 + 24);

    let peaks = fs::read_to_string(config.output_dir.join(report::FIG_PEAK_EXCEEDANCE)).unwrap();
    // Wildcat's two equal peaks share rank 1.5
    assert!(peaks.lines().any(|l| l.starts_with("Wildcat,") && l.contains(",1.5,0.5")));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(config.output_dir.join(report::SUMMARY_FILE)).unwrap())
            .unwrap();
    assert_eq!(json["gauges"].as_array().map(|g| g.len()), Some(2));
}

#[test]
fn test_missing_discharge_file_is_fatal() {
    let mut config = write_fixture_config("missing_file");
    config.gauges[1].discharge_file = PathBuf::from("/nonexistent/flostat/tippe.txt");

    match report::run(&config) {
        Err(ReportError::Load(LoadError::Io { .. })) => {}
        other => panic!("expected Io load error, got {:?}", other.map(|s| s.figures)),
    }
    assert!(!config.output_dir.join(report::SUMMARY_FILE).exists());
}

#[test]
fn test_metrics_without_station_column_is_fatal() {
    let config = write_fixture_config("no_station");
    fs::write(&config.metrics_file, "Date,Peak Flow\n1970-09-30,100\n").unwrap();

    match report::run(&config) {
        Err(ReportError::Load(LoadError::MissingColumn(col))) => assert_eq!(col, "Station"),
        other => panic!("expected MissingColumn, got {:?}", other.map(|s| s.figures)),
    }
}
