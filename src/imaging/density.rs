use image::GrayImage;
use imageproc::stats::histogram;

use crate::error::PreprocessingError;

use super::operations::FOREGROUND;

#[derive(Clone, Copy, Debug, Default)]
pub struct DensityExtractor;

impl DensityExtractor {
    pub fn new() -> Self {
        DensityExtractor
    }

    /// Fraction of pixels equal to 255.
    pub fn extract_density(&self, binary: &GrayImage) -> Result<f64, PreprocessingError> {
        let (width, height) = binary.dimensions();
        let total = width as u64 * height as u64;
        if total == 0 {
            return Err(PreprocessingError::EmptyImage { width, height });
        }

        let foreground = histogram(binary).channels[0][FOREGROUND as usize];
        Ok(foreground as f64 / total as f64)
    }
}
