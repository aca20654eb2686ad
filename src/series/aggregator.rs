use log::debug;

use crate::analysis::types::Observation;
use crate::error::AggregationError;
use crate::utils::{round_opt, round_to};

use super::statistics::SummaryStatistics;
use super::types::{ChartDataset, ChartPoint, SeriesAnalysis, SeriesRow};

pub const DISPLAY_DECIMALS: i32 = 2;
pub const CHART_LABEL: &str = "Vessel Density";

/// Derives the time series from a finished batch. Holds no state between
/// calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeSeriesAggregator;

impl TimeSeriesAggregator {
    pub fn new() -> Self {
        TimeSeriesAggregator
    }

    /// Rows come out in ascending capture order; equal timestamps keep their
    /// input order. Deltas and rolling averages use unrounded densities and
    /// are rounded only for the row view.
    pub fn aggregate(&self, observations: &[Observation]) -> Result<SeriesAnalysis, AggregationError> {
        if let Some(invalid) = observations
            .iter()
            .find(|o| !(0.0..=1.0).contains(&o.vessel_density()))
        {
            return Err(AggregationError::InvalidDensity {
                id: invalid.id().clone(),
                value: invalid.vessel_density(),
            });
        }

        let mut ordered: Vec<&Observation> = observations.iter().collect();
        ordered.sort_by_key(|o| o.captured_at());

        let mut running_sum = 0.0;
        let mut previous: Option<f64> = None;

        let rows: Vec<SeriesRow> = ordered
            .iter()
            .enumerate()
            .map(|(index, observation)| {
                let density = observation.vessel_density();
                running_sum += density;
                let delta = previous.map(|p| density - p);
                previous = Some(density);

                SeriesRow {
                    index,
                    observation_id: observation.id().clone(),
                    captured_at: observation.captured_at(),
                    segmented_image: observation.segmented_image().clone(),
                    vessel_density: round_to(density, DISPLAY_DECIMALS),
                    delta: round_opt(delta, DISPLAY_DECIMALS),
                    rolling_average: round_to(running_sum / (index + 1) as f64, DISPLAY_DECIMALS),
                }
            })
            .collect();

        let densities: Vec<f64> = ordered.iter().map(|o| o.vessel_density()).collect();
        let stats = SummaryStatistics::compute(&densities);

        let chart = ChartDataset {
            label: CHART_LABEL.to_string(),
            points: ordered
                .iter()
                .map(|o| ChartPoint {
                    captured_at: o.captured_at(),
                    vessel_density: o.vessel_density(),
                })
                .collect(),
        };

        debug!("Aggregated {} observations", rows.len());

        Ok(SeriesAnalysis { rows, stats, chart })
    }
}
