/// USGS daily-value discharge file reader
///
/// Reads the tab/space-delimited RDB text that NWIS serves for daily mean
/// discharge:
///
/// ```text
/// # comment lines
/// agency_cd  site_no   datetime    142935_00060_00003  142935_00060_00003_cd
/// 5s         15s       20d         14n                 10s
/// USGS       03335000  1954-06-01  28.0                A
/// ```
///
/// Column order is fixed: agency code, site id, date, discharge, quality.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::model::{DailyRecord, DailySeries, LoadError, LoadedSeries};

/// Discharge tokens that mean "no value" besides anything unparsable.
/// `Eqp` is the USGS equipment-malfunction code.
pub const MISSING_TOKENS: &[&str] = &[
    "Eqp", "NaN", "nan", "NA", "N/A", "null", "#N/A", "-", "",
];

// ============================================================================
// Entry Points
// ============================================================================

/// Read and parse a discharge file from disk.
pub fn load_daily_series(path: impl AsRef<Path>) -> Result<LoadedSeries, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_daily_series(&text)
}

/// Parse discharge file contents.
///
/// Negative discharges are forced to missing, and the returned missing
/// count includes them.
pub fn parse_daily_series(text: &str) -> Result<LoadedSeries, LoadError> {
    let mut records = Vec::new();
    let mut seen_header = false;
    let mut after_header = false;
    let mut negatives_corrected = 0;
    let mut first_seen: HashMap<NaiveDate, usize> = HashMap::new();

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if !seen_header {
            seen_header = true;
            after_header = true;
            continue;
        }

        let fields = split_fields(line);

        if after_header {
            after_header = false;
            if is_rdb_type_line(&fields) {
                continue;
            }
        }

        if fields.len() < 4 {
            return Err(LoadError::Malformed {
                line: line_no,
                reason: format!("expected at least 4 columns, found {}", fields.len()),
            });
        }

        let date = parse_date(fields[2]).ok_or_else(|| LoadError::Malformed {
            line: line_no,
            reason: format!("unparsable date '{}'", fields[2]),
        })?;

        if let Some(first) = first_seen.insert(date, line_no) {
            return Err(LoadError::Malformed {
                line: line_no,
                reason: format!("duplicate date {} (first seen on line {})", date, first),
            });
        }

        let discharge = match parse_discharge(fields[3]) {
            Some(q) if q < 0.0 => {
                // gross error: negative flow is physically impossible
                negatives_corrected += 1;
                None
            }
            other => other,
        };

        records.push(DailyRecord {
            date,
            agency_code: fields[0].to_string(),
            site_id: fields[1].to_string(),
            discharge,
            quality: fields.get(4).filter(|q| !q.is_empty()).map(|q| q.to_string()),
        });
    }

    if !seen_header {
        return Err(LoadError::Empty);
    }

    // duplicates were rejected above, so this only sorts
    let series = DailySeries::from_records(records).map_err(|date| LoadError::Malformed {
        line: first_seen.get(&date).copied().unwrap_or_default(),
        reason: format!("duplicate date {}", date),
    })?;
    let missing = series.missing_count();

    Ok(LoadedSeries {
        series,
        missing,
        negatives_corrected,
    })
}

// ============================================================================
// Field Helpers
// ============================================================================

/// Split a data line into cells. Tab-delimited lines keep empty cells so a
/// blank discharge stays in its column; other lines split on whitespace runs.
fn split_fields(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// Parse a discharge cell. Sentinels, unparsable text and non-finite
/// numbers all come back as `None`.
pub fn parse_discharge(token: &str) -> Option<f64> {
    let token = token.trim();
    if MISSING_TOKENS.contains(&token) {
        return None;
    }
    token.parse::<f64>().ok().filter(|q| q.is_finite())
}

fn parse_date(token: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(token, "%m/%d/%Y"))
        .ok()
}

/// RDB files follow the header with a field-type line such as
/// `5s 15s 20d 14n 10s`.
fn is_rdb_type_line(fields: &[&str]) -> bool {
    !fields.is_empty()
        && fields.iter().all(|f| {
            f.strip_suffix(|c: char| matches!(c, 's' | 'd' | 'n'))
                .is_some_and(|digits| {
                    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
                })
        })
}

// ============================================================================
// Tests
// ============================================================================
