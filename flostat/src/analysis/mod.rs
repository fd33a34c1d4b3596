/// Descriptive statistics over daily discharge series.
///
/// Everything here is pure: each function takes a borrowed input and
/// returns a new value. Missing discharges are skipped, and undefined
/// results are reported as `f64::NAN`.
///
/// Submodules:
/// - `clip` — restricts a series to a date window.
/// - `monthly` — per-calendar-month mean, CV, Tqmean and R-B index.
/// - `climatology` — 12-month multi-year averages.
/// - `peaks` — Weibull exceedance probabilities for annual peaks.

pub mod climatology;
pub mod clip;
pub mod monthly;
pub mod peaks;

/// Arithmetic mean of the finite values, or NaN if there are none.
pub(crate) fn mean_finite(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_finite_skips_nan() {
        assert_eq!(mean_finite([1.0, f64::NAN, 3.0]), 2.0);
        assert!(mean_finite([f64::NAN]).is_nan());
        assert!(mean_finite(std::iter::empty()).is_nan());
    }
}
