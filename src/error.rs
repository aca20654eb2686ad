use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::types::ObservationId;

/// The input could not be materialized into pixels.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// A degenerate image reached the segmentation stage.
#[derive(Debug, Error, PartialEq)]
pub enum PreprocessingError {
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Unsupported channel layout: {0} channels")]
    UnsupportedChannels(u8),
}

#[derive(Debug, Error, PartialEq)]
pub enum AggregationError {
    #[error("Observation {id} has vessel density {value} outside [0, 1]")]
    InvalidDensity { id: ObservationId, value: f64 },
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Preprocessing error: {0}")]
    Preprocessing(#[from] PreprocessingError),

    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("Observation {id} failed: {source}")]
    Observation {
        id: ObservationId,
        #[source]
        source: Box<AnalysisError>,
    },

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// None of the variants succeed on a retry with the same input; only a
    /// cancelled batch may be started again as is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalysisError::Cancelled)
    }
}
