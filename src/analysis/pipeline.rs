use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use log::{debug, error, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::AnalysisError;
use crate::imaging::{DensityExtractor, ImagePreprocessor, LoadImage};
use crate::series::TimeSeriesAggregator;
use crate::settings::AnalysisSettings;

use super::types::{
    Analysis, AnalysisProgress, BatchOutcome, Observation, ObservationFailure, ObservationId,
    RawObservationInput,
};

type ItemResult = (ObservationId, Result<Observation, AnalysisError>);

/// Progress steps saturate at `u32::MAX`.
fn step_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Runs decode, segmentation and density extraction per input. Batches
/// run on a dedicated worker pool; every worker uses its own buffers.
pub struct ObservationPipeline {
    settings: AnalysisSettings,
    pool: ThreadPool,
    preprocessor: ImagePreprocessor,
    extractor: DensityExtractor,
}

impl ObservationPipeline {
    pub fn new(settings: AnalysisSettings) -> Result<Self, AnalysisError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.worker_threads)
            .thread_name(|i| format!("ffa-worker-{i}"))
            .build()?;

        info!(
            "Observation pipeline ready with {} workers",
            settings.worker_threads
        );

        Ok(ObservationPipeline {
            settings,
            pool,
            preprocessor: ImagePreprocessor::new(),
            extractor: DensityExtractor::new(),
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn process(&self, input: RawObservationInput) -> Result<Observation, AnalysisError> {
        let image = input.image.load()?;
        let segmented = self.preprocessor.segment(&image)?;
        drop(image);

        let vessel_density = self.extractor.extract_density(&segmented)?;
        debug!("Observation {} has vessel density {:.4}", input.id, vessel_density);

        Ok(Observation::new(input, Arc::new(segmented), vessel_density))
    }

    /// Processes every input in parallel. One input failing does not stop
    /// the others unless `all_or_nothing` is set. Raising `stop_signal`
    /// skips inputs not yet started and discards the whole batch.
    pub fn process_batch(
        &self,
        inputs: Vec<RawObservationInput>,
        progress: Option<Sender<AnalysisProgress>>,
        stop_signal: &AtomicBool,
    ) -> Result<BatchOutcome, AnalysisError> {
        let total_steps = step_count(inputs.len());
        let completed = AtomicU32::new(0);
        info!("Processing batch of {total_steps} observations");

        let results: Vec<Option<ItemResult>> = self.pool.install(|| {
            inputs
                .into_par_iter()
                .map_with(progress, |progress, input| {
                    if stop_signal.load(Ordering::SeqCst) {
                        return None;
                    }

                    let id = input.id.clone();
                    let result = self.process(input);
                    let current_step = completed.fetch_add(1, Ordering::SeqCst) + 1;

                    if let Some(tx) = progress {
                        let _ = tx.send(AnalysisProgress::processed(&id, current_step, total_steps));
                    }

                    Some((id, result))
                })
                .collect()
        });

        if stop_signal.load(Ordering::SeqCst) {
            info!(
                "Batch cancelled after {} of {total_steps} observations",
                completed.load(Ordering::SeqCst)
            );
            return Err(AnalysisError::Cancelled);
        }

        let mut outcome = BatchOutcome::default();
        for (id, result) in results.into_iter().flatten() {
            match result {
                Ok(observation) => outcome.observations.push(observation),
                Err(error) => {
                    error!("Observation {id} failed: {error}");
                    if self.settings.all_or_nothing {
                        return Err(AnalysisError::Observation {
                            id,
                            source: Box::new(error),
                        });
                    }
                    outcome.failures.push(ObservationFailure { id, error });
                }
            }
        }

        info!(
            "Batch finished: {} observations, {} failures",
            outcome.observations.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }

    /// Processes the batch, waits for every item, then aggregates the
    /// successful observations in capture order.
    pub fn analyse(
        &self,
        inputs: Vec<RawObservationInput>,
        progress: Option<Sender<AnalysisProgress>>,
        stop_signal: &AtomicBool,
    ) -> Result<Analysis, AnalysisError> {
        let outcome = self.process_batch(inputs, progress, stop_signal)?;
        let series = TimeSeriesAggregator::new().aggregate(&outcome.observations)?;

        Ok(Analysis {
            series,
            failures: outcome.failures,
        })
    }
}
