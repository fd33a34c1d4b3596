/// Date-window clipping.

use chrono::NaiveDate;

use crate::model::DailySeries;

/// Returns the records dated within `[start, end]` (inclusive) and the
/// missing-discharge count over that range.
///
/// A window that runs past the data keeps whatever overlaps. A window
/// that misses the data entirely yields an empty series and a count of 0.
pub fn clip_series(series: &DailySeries, start: NaiveDate, end: NaiveDate) -> (DailySeries, usize) {
    let clipped = DailySeries::from_sorted(series.window(start, end).to_vec());
    let missing = clipped.missing_count();
    (clipped, missing)
}
