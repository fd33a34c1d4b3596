/// Calendar-month resampling of a daily discharge series.

use chrono::{Datelike, NaiveDate};

use crate::model::{DailyRecord, DailySeries, MonthlyStats};

/// Buckets `series` by calendar month and computes the flow statistics
/// of each bucket.
///
/// Only months with at least one record produce a row. Missing discharges
/// are left out of every statistic. A month with no observations yields
/// NaN throughout.
pub fn monthly_statistics(series: &DailySeries) -> Vec<MonthlyStats> {
    let mut table = Vec::new();
    let records = series.records();
    let mut start = 0;

    while start < records.len() {
        let key = month_start(records[start].date);
        let len = records[start..]
            .iter()
            .take_while(|r| month_start(r.date) == key)
            .count();
        table.push(bucket_stats(key, &records[start..start + len]));
        start += len;
    }

    table
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn bucket_stats(month_start: NaiveDate, bucket: &[DailyRecord]) -> MonthlyStats {
    let flows: Vec<f64> = bucket.iter().filter_map(|r| r.discharge).collect();
    let mean_flow = mean(&flows);

    MonthlyStats {
        month_start,
        site_id: bucket.first().map(|r| r.site_id.clone()).unwrap_or_default(),
        mean_flow,
        coeff_var: coefficient_of_variation(&flows, mean_flow),
        tq_mean: tq_mean(&flows, mean_flow),
        rb_index: richards_baker_index(&flows),
    }
}

fn mean(flows: &[f64]) -> f64 {
    if flows.is_empty() {
        return f64::NAN;
    }
    flows.iter().sum::<f64>() / flows.len() as f64
}

/// Sample (n - 1) standard deviation.
fn sample_std_dev(flows: &[f64], mean: f64) -> f64 {
    if flows.len() < 2 {
        return f64::NAN;
    }
    let ss: f64 = flows.iter().map(|q| (q - mean).powi(2)).sum();
    (ss / (flows.len() - 1) as f64).sqrt()
}

/// Standard deviation over mean, as a percentage. NaN for a zero or
/// undefined mean.
pub fn coefficient_of_variation(flows: &[f64], mean: f64) -> f64 {
    if !mean.is_finite() || mean == 0.0 {
        return f64::NAN;
    }
    sample_std_dev(flows, mean) / mean * 100.0
}

/// Fraction of observations that exceed `mean`.
pub fn tq_mean(flows: &[f64], mean: f64) -> f64 {
    if flows.is_empty() || !mean.is_finite() {
        return f64::NAN;
    }
    flows.iter().filter(|&&q| q > mean).count() as f64 / flows.len() as f64
}

/// Sum of absolute day-to-day changes divided by total flow.
pub fn richards_baker_index(flows: &[f64]) -> f64 {
    let total: f64 = flows.iter().sum();
    if flows.is_empty() || total == 0.0 {
        return f64::NAN;
    }
    let path: f64 = flows.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    path / total
}
