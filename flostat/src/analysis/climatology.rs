/// Multi-year monthly averages (seasonal profile).

use std::collections::HashMap;

use chrono::Datelike;

use super::mean_finite;
use crate::model::{ClimatologyRow, MonthlyStats};

/// Averages each monthly statistic across all years, grouped by the
/// calendar month of `month_start`.
///
/// Returns one row per calendar month, January first. A month absent
/// from `table` (or with only NaN values for a field) averages to NaN.
pub fn monthly_averages(table: &[MonthlyStats]) -> [ClimatologyRow; 12] {
    let site_id = dominant_site_id(table);

    std::array::from_fn(|i| {
        let month = i as u32 + 1;
        let group: Vec<&MonthlyStats> = table
            .iter()
            .filter(|row| row.month_start.month() == month)
            .collect();

        ClimatologyRow {
            month,
            site_id: site_id.clone(),
            mean_flow: mean_finite(group.iter().map(|r| r.mean_flow)),
            coeff_var: mean_finite(group.iter().map(|r| r.coeff_var)),
            tq_mean: mean_finite(group.iter().map(|r| r.tq_mean)),
            rb_index: mean_finite(group.iter().map(|r| r.rb_index)),
        }
    })
}

/// Most frequent site id in the table; ties go to the earliest seen.
fn dominant_site_id(table: &[MonthlyStats]) -> String {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (i, row) in table.iter().enumerate() {
        counts.entry(row.site_id.as_str()).or_insert((0, i)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(id, _)| id.to_string())
        .unwrap_or_default()
}
