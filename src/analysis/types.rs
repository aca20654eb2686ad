use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::imaging::ImageSource;
use crate::series::SeriesAnalysis;

/// Caller-assigned identifier used to correlate results and failures with
/// the originating input. Never used for ordering.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationId(pub String);

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObservationId {
    fn from(id: &str) -> Self {
        ObservationId(id.to_owned())
    }
}

impl From<String> for ObservationId {
    fn from(id: String) -> Self {
        ObservationId(id)
    }
}

/// Shared handle to a segmented image. The buffer is released when the last
/// observation or row holding it is dropped.
pub type SegmentedImage = Arc<GrayImage>;

#[derive(Clone, Debug)]
pub struct RawObservationInput {
    pub id: ObservationId,
    pub captured_at: DateTime<Utc>,
    pub image: ImageSource,
}

impl RawObservationInput {
    pub fn new(
        id: impl Into<ObservationId>,
        captured_at: DateTime<Utc>,
        image: impl Into<ImageSource>,
    ) -> Self {
        RawObservationInput {
            id: id.into(),
            captured_at,
            image: image.into(),
        }
    }
}

/// One image's pipeline result. Fields are read-only once produced.
#[derive(Clone, Debug)]
pub struct Observation {
    input: RawObservationInput,
    segmented_image: SegmentedImage,
    vessel_density: f64,
}

impl Observation {
    pub(crate) fn new(
        input: RawObservationInput,
        segmented_image: SegmentedImage,
        vessel_density: f64,
    ) -> Self {
        Observation {
            input,
            segmented_image,
            vessel_density,
        }
    }

    pub fn input(&self) -> &RawObservationInput {
        &self.input
    }

    pub fn id(&self) -> &ObservationId {
        &self.input.id
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.input.captured_at
    }

    pub fn segmented_image(&self) -> &SegmentedImage {
        &self.segmented_image
    }

    pub fn vessel_density(&self) -> f64 {
        self.vessel_density
    }
}

#[derive(Debug)]
pub struct ObservationFailure {
    pub id: ObservationId,
    pub error: AnalysisError,
}

/// Successful observations and per-input failures, both in input order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub observations: Vec<Observation>,
    pub failures: Vec<ObservationFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct Analysis {
    pub series: SeriesAnalysis,
    pub failures: Vec<ObservationFailure>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct AnalysisProgress {
    pub message: String,
    pub current_step: u32,
    pub total_steps: u32,
}

impl AnalysisProgress {
    /// Progress after the `current_step`-th observation of the batch finished.
    pub fn processed(id: &ObservationId, current_step: u32, total_steps: u32) -> Self {
        AnalysisProgress {
            message: format!("Processed {id}"),
            current_step,
            total_steps,
        }
    }

    pub fn fraction(&self) -> f64 {
        if self.total_steps == 0 {
            1.0
        } else {
            self.current_step as f64 / self.total_steps as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processed_progress() {
        let progress = AnalysisProgress::processed(&ObservationId::from("visit-a"), 1, 4);
        assert_eq!(progress.message, "Processed visit-a");
        assert_eq!(progress.current_step, 1);
        assert_eq!(progress.total_steps, 4);
        assert_eq!(progress.fraction(), 0.25);

        let empty = AnalysisProgress::processed(&ObservationId::from("none"), 0, 0);
        assert_eq!(empty.fraction(), 1.0);
    }

    #[test]
    fn test_observation_id_is_transparent() {
        let id = ObservationId::from("fundus-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"fundus-7\"");
        assert_eq!(id.to_string(), "fundus-7");
    }
}
