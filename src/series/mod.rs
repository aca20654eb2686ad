pub mod aggregator;
pub mod statistics;
pub mod types;

pub use aggregator::TimeSeriesAggregator;
pub use statistics::SummaryStatistics;
pub use types::{ChartDataset, ChartPoint, SeriesAnalysis, SeriesRow};
