/// Core data types for the two-gauge streamflow comparison.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O, only types and the error enums every stage reports.

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Daily discharge
// ---------------------------------------------------------------------------

/// One row of a USGS daily-value discharge file.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub agency_code: String,
    pub site_id: String,
    /// Mean daily discharge in cubic feet per second. `None` when the
    /// file carried a sentinel, an unparsable cell, or a negative value.
    pub discharge: Option<f64>,
    pub quality: Option<String>,
}

/// Daily records ordered by date, one record per date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailySeries {
    records: Vec<DailyRecord>,
}

impl DailySeries {
    /// Builds a series, sorting by date. Fails on a duplicated date.
    pub fn from_records(mut records: Vec<DailyRecord>) -> Result<Self, NaiveDate> {
        records.sort_by_key(|r| r.date);
        if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(pair[0].date);
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Number of records whose discharge is missing.
    pub fn missing_count(&self) -> usize {
        self.records.iter().filter(|r| r.discharge.is_none()).count()
    }

    /// Records in `[start, end]`. The slice is contiguous because the
    /// series is sorted.
    pub(crate) fn window(&self, start: NaiveDate, end: NaiveDate) -> &[DailyRecord] {
        if start > end {
            return &[];
        }
        let lo = self.records.partition_point(|r| r.date < start);
        let hi = self.records.partition_point(|r| r.date <= end);
        &self.records[lo..hi]
    }

    pub(crate) fn from_sorted(records: Vec<DailyRecord>) -> Self {
        Self { records }
    }
}

/// Loader output: the cleaned series plus its missing-value bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSeries {
    pub series: DailySeries,
    /// Missing discharges after negative values were forced to missing.
    pub missing: usize,
    /// How many negative discharges were forced to missing.
    pub negatives_corrected: usize,
}

// ---------------------------------------------------------------------------
// Monthly statistics
// ---------------------------------------------------------------------------

/// Statistics for one calendar month of daily discharge.
///
/// Undefined statistics (all-missing month, zero mean) are `f64::NAN`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStats {
    /// First day of the month.
    pub month_start: NaiveDate,
    pub site_id: String,
    pub mean_flow: f64,
    /// Sample standard deviation over mean, as a percentage.
    pub coeff_var: f64,
    /// Fraction of days whose discharge exceeds `mean_flow`.
    pub tq_mean: f64,
    /// Richards-Baker flashiness index.
    pub rb_index: f64,
}

/// Multi-year average of the monthly statistics for one month of the year.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimatologyRow {
    /// Calendar month, 1 = January.
    pub month: u32,
    pub site_id: String,
    pub mean_flow: f64,
    pub coeff_var: f64,
    pub tq_mean: f64,
    pub rb_index: f64,
}

// ---------------------------------------------------------------------------
// Annual peaks
// ---------------------------------------------------------------------------

/// An annual peak flow with its Weibull plotting position.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakExceedance {
    pub date: NaiveDate,
    pub peak_flow: f64,
    /// 1 = largest peak. Tied peaks share their average rank.
    pub rank: f64,
    /// rank / (N + 1)
    pub exceedance_probability: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when reading discharge or metrics files.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The file could not be opened or read.
    Io { path: String, message: String },
    /// The file held no header line.
    Empty,
    /// A data line could not be interpreted (1-based line number).
    Malformed { line: usize, reason: String },
    /// A required column is absent.
    MissingColumn(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { path, message } => write!(f, "I/O error reading {}: {}", path, message),
            LoadError::Empty => write!(f, "No header line found"),
            LoadError::Malformed { line, reason } => {
                write!(f, "Malformed line {}: {}", line, reason)
            }
            LoadError::MissingColumn(name) => write!(f, "Missing column: {}", name),
        }
    }
}

impl std::error::Error for LoadError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, discharge: Option<f64>) -> DailyRecord {
        DailyRecord {
            date: NaiveDate::from_ymd_opt(2000, 1, day).unwrap(),
            agency_code: "USGS".to_string(),
            site_id: "03335000".to_string(),
            discharge,
            quality: Some("A".to_string()),
        }
    }

    #[test]
    fn test_from_records_sorts_by_date() {
        let series =
            DailySeries::from_records(vec![record(3, Some(3.0)), record(1, Some(1.0))]).unwrap();
        assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2000, 1, 1));
        assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2000, 1, 3));
    }

    #[test]
    fn test_from_records_rejects_duplicate_dates() {
        let err = DailySeries::from_records(vec![record(2, None), record(2, Some(1.0))]);
        assert_eq!(err, Err(NaiveDate::from_ymd_opt(2000, 1, 2).unwrap()));
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let series = DailySeries::from_records(vec![record(1, None), record(2, None)]).unwrap();
        let start = NaiveDate::from_ymd_opt(2000, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert!(series.window(start, end).is_empty());
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::Malformed { line: 7, reason: "bad date".to_string() };
        assert_eq!(err.to_string(), "Malformed line 7: bad date");
    }
}
