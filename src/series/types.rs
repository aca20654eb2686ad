use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::types::{ObservationId, SegmentedImage};
use crate::error::DecodeError;
use crate::imaging::to_data_url;
use crate::utils::serialize_date;

use super::statistics::SummaryStatistics;

/// One row of the time-ordered table. Densities are rounded for display.
#[derive(Clone, Serialize, Debug)]
pub struct SeriesRow {
    pub index: usize,
    pub observation_id: ObservationId,
    #[serde(serialize_with = "serialize_date")]
    pub captured_at: DateTime<Utc>,
    #[serde(skip)]
    pub segmented_image: SegmentedImage,
    pub vessel_density: f64,
    pub delta: Option<f64>,
    pub rolling_average: f64,
}

impl SeriesRow {
    pub fn thumbnail_data_url(&self) -> Result<String, DecodeError> {
        to_data_url(&self.segmented_image)
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ChartPoint {
    pub captured_at: DateTime<Utc>,
    pub vessel_density: f64,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ChartDataset {
    pub label: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Clone, Serialize, Debug)]
pub struct SeriesAnalysis {
    pub rows: Vec<SeriesRow>,
    pub stats: Option<SummaryStatistics>,
    pub chart: ChartDataset,
}

impl SeriesAnalysis {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
