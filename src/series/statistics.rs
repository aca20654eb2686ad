use serde::Serialize;

/// Dataset-level statistics over unrounded vessel densities.
#[derive(Clone, Copy, Serialize, Debug, PartialEq)]
pub struct SummaryStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub standard_deviation: f64,
}

impl SummaryStatistics {
    /// `None` for an empty slice.
    ///
    /// The median is the element at `floor(n / 2)` of the sorted values, so an
    /// even count takes the upper of the two middle values. The standard
    /// deviation is the population form (divides by `n`).
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = sorted[count / 2];

        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(SummaryStatistics {
            count,
            mean,
            median,
            min,
            max,
            standard_deviation: variance.sqrt(),
        })
    }
}
