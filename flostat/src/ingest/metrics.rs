/// Metrics table reader
///
/// Ingests the comma-delimited annual or monthly metrics produced by an
/// earlier processing stage. Only the `Date` column is required. Every
/// other column passes through, typed as read.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::model::LoadError;

pub const DATE_COLUMN: &str = "Date";
pub const STATION_COLUMN: &str = "Station";

// ============================================================================
// Table Structures
// ============================================================================

/// A single cell of a metrics table.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Missing,
}

impl MetricValue {
    fn from_cell(cell: &str) -> Self {
        let cell = cell.trim();
        if matches!(cell, "" | "NaN" | "nan" | "NA" | "N/A" | "null" | "#N/A") {
            return MetricValue::Missing;
        }
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => MetricValue::Number(v),
            Ok(_) => MetricValue::Missing,
            Err(_) => MetricValue::Text(cell.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRow {
    pub date: NaiveDate,
    /// One value per entry of `MetricsTable::columns`.
    pub values: Vec<MetricValue>,
}

/// A dated table; `columns` excludes the date column itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsTable {
    pub columns: Vec<String>,
    pub rows: Vec<MetricsRow>,
}

impl MetricsTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Rows whose `Station` column equals `station`.
    pub fn filter_station(&self, station: &str) -> Result<MetricsTable, LoadError> {
        let idx = self
            .column_index(STATION_COLUMN)
            .ok_or_else(|| LoadError::MissingColumn(STATION_COLUMN.to_string()))?;

        let rows = self
            .rows
            .iter()
            .filter(|row| match &row.values[idx] {
                MetricValue::Text(s) => s == station,
                MetricValue::Number(v) => station.parse::<f64>().ok() == Some(*v),
                MetricValue::Missing => false,
            })
            .cloned()
            .collect();

        Ok(MetricsTable {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// `(date, value)` pairs for a numeric column. Non-numeric cells are `None`.
    pub fn column(&self, name: &str) -> Result<Vec<(NaiveDate, Option<f64>)>, LoadError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
        Ok(self
            .rows
            .iter()
            .map(|row| (row.date, row.values[idx].as_f64()))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Entry Points
// ============================================================================

pub fn load_metrics(path: impl AsRef<Path>) -> Result<MetricsTable, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_metrics(file)
}

pub fn parse_metrics<R: Read>(reader: R) -> Result<MetricsTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.is_empty() {
        return Err(LoadError::Empty);
    }

    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let names: Vec<&str> = headers.iter().map(|h| h.trim_start_matches('\u{feff}')).collect();

    let date_idx = names
        .iter()
        .position(|h| *h == DATE_COLUMN)
        .ok_or_else(|| LoadError::MissingColumn(DATE_COLUMN.to_string()))?;

    let columns: Vec<String> = names
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_idx)
        .map(|(_, h)| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts on the line after the header
        let line = idx + 2;
        let record = result.map_err(csv_error)?;
        rows.push(parse_row(&record, date_idx, columns.len(), line)?);
    }

    Ok(MetricsTable { columns, rows })
}

fn parse_row(
    record: &StringRecord,
    date_idx: usize,
    width: usize,
    line: usize,
) -> Result<MetricsRow, LoadError> {
    let raw_date = record.get(date_idx).unwrap_or("");
    let date = parse_metrics_date(raw_date).ok_or_else(|| LoadError::Malformed {
        line,
        reason: format!("unparsable date '{}'", raw_date),
    })?;

    let values: Vec<MetricValue> = record
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_idx)
        .map(|(_, cell)| MetricValue::from_cell(cell))
        .collect();

    if values.len() != width {
        return Err(LoadError::Malformed {
            line,
            reason: format!("expected {} columns, found {}", width + 1, values.len() + 1),
        });
    }

    Ok(MetricsRow { date, values })
}

fn parse_metrics_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

fn csv_error(err: csv::Error) -> LoadError {
    let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
    LoadError::Malformed {
        line,
        reason: err.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
