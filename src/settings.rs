use serde::{Deserialize, Serialize};

/// Batch execution settings. The segmentation constants are fixed and are
/// not configurable here.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct AnalysisSettings {
    pub worker_threads: usize,
    pub all_or_nothing: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettingsBuilder::new().build()
    }
}

pub struct AnalysisSettingsBuilder {
    worker_threads: usize,
    all_or_nothing: bool,
}

impl AnalysisSettingsBuilder {
    pub fn new() -> Self {
        AnalysisSettingsBuilder {
            worker_threads: num_cpus::get(),
            all_or_nothing: false,
        }
    }

    /// Zero is clamped to a single worker.
    pub fn worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads.max(1);
        self
    }

    pub fn all_or_nothing(mut self, all_or_nothing: bool) -> Self {
        self.all_or_nothing = all_or_nothing;
        self
    }

    pub fn build(self) -> AnalysisSettings {
        AnalysisSettings {
            worker_threads: self.worker_threads,
            all_or_nothing: self.all_or_nothing,
        }
    }
}

impl Default for AnalysisSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
