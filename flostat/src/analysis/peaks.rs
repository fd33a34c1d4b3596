/// Return-period analysis of annual peak flows.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::model::PeakExceedance;

/// Ranks annual peaks from largest (rank 1) to smallest and assigns each
/// its Weibull plotting position `rank / (N + 1)`.
///
/// Missing peaks are dropped before N is counted. Tied peaks share the
/// average of the ranks they span. The output is sorted by descending
/// peak flow; dates break ties in file order.
pub fn exceedance_probabilities(peaks: &[(NaiveDate, Option<f64>)]) -> Vec<PeakExceedance> {
    let mut sorted: Vec<(NaiveDate, f64)> = peaks
        .iter()
        .filter_map(|&(date, q)| q.filter(|v| v.is_finite()).map(|v| (date, v)))
        .collect();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let n = sorted.len();
    let mut out = Vec::with_capacity(n);
    let mut i = 0;

    while i < n {
        let tie_len = sorted[i..].iter().take_while(|p| p.1 == sorted[i].1).count();
        // ranks i+1 ..= i+tie_len, averaged
        let rank = i as f64 + (tie_len as f64 + 1.0) / 2.0;
        for &(date, peak_flow) in &sorted[i..i + tie_len] {
            out.push(PeakExceedance {
                date,
                peak_flow,
                rank,
                exceedance_probability: rank / (n as f64 + 1.0),
            });
        }
        i += tie_len;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, 9, 30).unwrap()
    }

    #[test]
    fn test_weibull_positions() {
        let peaks = vec![(year(1970), Some(300.0)), (year(1971), Some(900.0)), (year(1972), Some(600.0))];
        let out = exceedance_probabilities(&peaks);
        let flows: Vec<f64> = out.iter().map(|p| p.peak_flow).collect();
        assert_eq!(flows, vec![900.0, 600.0, 300.0]);
        assert_eq!(out[0].rank, 1.0);
        assert_eq!(out[0].exceedance_probability, 0.25);
        assert_eq!(out[2].exceedance_probability, 0.75);
        assert_eq!(out[0].date, year(1971));
    }

    #[test]
    fn test_ties_share_average_rank() {
        let peaks = vec![
            (year(1970), Some(500.0)),
            (year(1971), Some(800.0)),
            (year(1972), Some(500.0)),
            (year(1973), Some(100.0)),
        ];
        let out = exceedance_probabilities(&peaks);
        let ranks: Vec<f64> = out.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
        assert_eq!(out[1].exceedance_probability, 0.5);
    }

    #[test]
    fn test_missing_peaks_are_dropped() {
        let peaks = vec![(year(1970), None), (year(1971), Some(10.0))];
        let out = exceedance_probabilities(&peaks);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].exceedance_probability, 0.5);
    }

    #[test]
    fn test_empty_input() {
        assert!(exceedance_probabilities(&[]).is_empty());
    }
}
