//! Vessel density analysis for fundus angiography image series.
//!
//! Each image is segmented (grayscale, CLAHE, Gaussian smoothing, adaptive
//! threshold) and reduced to the fraction of foreground pixels. A finished
//! batch is then ordered by capture time and summarised as table rows with
//! deltas and a cumulative rolling average, dataset statistics and a chart
//! series.
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//!
//! use chrono::Utc;
//! use ffa_density::{AnalysisSettings, ImageSource, ObservationPipeline, RawObservationInput};
//!
//! # fn main() -> Result<(), ffa_density::AnalysisError> {
//! let pipeline = ObservationPipeline::new(AnalysisSettings::default())?;
//! let inputs = vec![RawObservationInput::new(
//!     "visit-1",
//!     Utc::now(),
//!     ImageSource::from_path("fundus_visit_1.png"),
//! )];
//!
//! let analysis = pipeline.analyse(inputs, None, &AtomicBool::new(false))?;
//! for row in &analysis.series.rows {
//!     println!("{} {:?} {}", row.captured_at, row.delta, row.rolling_average);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod error;
pub mod imaging;
pub mod series;
pub mod settings;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use analysis::{
    Analysis, AnalysisProgress, BatchOutcome, Observation, ObservationFailure, ObservationId,
    ObservationPipeline, RawObservationInput, SegmentedImage,
};
pub use error::{AggregationError, AnalysisError, DecodeError, PreprocessingError};
pub use imaging::{DensityExtractor, ImagePreprocessor, ImageSource};
pub use series::{
    ChartDataset, ChartPoint, SeriesAnalysis, SeriesRow, SummaryStatistics, TimeSeriesAggregator,
};
pub use settings::{AnalysisSettings, AnalysisSettingsBuilder};
