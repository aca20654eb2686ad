use image::{DynamicImage, GrayImage};
use log::debug;

use crate::error::PreprocessingError;

use super::operations::{
    adaptive_threshold, clahe, gaussian_blur, to_grayscale, BLUR_KERNEL_SIZE, BLUR_SIGMA,
    CLAHE_CLIP_LIMIT, CLAHE_TILE_GRID, THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET,
};

/// Segments vessel-like structure out of a fundus image. The stage
/// parameters are fixed; the image is the only input.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    pub fn new() -> Self {
        ImagePreprocessor
    }

    /// Grayscale, CLAHE, Gaussian smoothing, then adaptive Gaussian
    /// thresholding. The result has the input's dimensions and holds only
    /// 0 and 255.
    pub fn segment(&self, image: &DynamicImage) -> Result<GrayImage, PreprocessingError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(PreprocessingError::EmptyImage { width, height });
        }

        let channels = image.color().channel_count();
        if !(1..=4).contains(&channels) {
            return Err(PreprocessingError::UnsupportedChannels(channels));
        }

        debug!("Segmenting {width}x{height} image with {channels} channels");

        let gray = to_grayscale(image);
        let enhanced = clahe(&gray, CLAHE_CLIP_LIMIT, CLAHE_TILE_GRID);
        drop(gray);

        let blurred = gaussian_blur(&enhanced, BLUR_KERNEL_SIZE, BLUR_SIGMA);
        drop(enhanced);

        Ok(adaptive_threshold(&blurred, THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET))
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Rgba, RgbaImage};

    use super::*;
    use crate::imaging::operations::{BACKGROUND, FOREGROUND};
    use crate::test_utils::{init_logging, vessel_phantom};

    fn is_binary(image: &GrayImage) -> bool {
        image.as_raw().iter().all(|&v| v == FOREGROUND || v == BACKGROUND)
    }

    #[test]
    fn test_segment_keeps_dimensions_and_is_binary() {
        init_logging();
        let preprocessor = ImagePreprocessor::new();

        for (w, h) in [(64, 48), (9, 31), (1, 1), (200, 120)] {
            let image = DynamicImage::ImageLuma8(vessel_phantom(w, h));
            let binary = preprocessor.segment(&image).unwrap();
            assert_eq!(binary.dimensions(), (w, h));
            assert!(is_binary(&binary));
        }
    }

    #[test]
    fn test_segment_colour_input() {
        let phantom = vessel_phantom(80, 60);
        let rgba = RgbaImage::from_fn(80, 60, |x, y| {
            let v = phantom.get_pixel(x, y)[0];
            Rgba([v, v / 2, v / 3, 255])
        });

        let binary = ImagePreprocessor::new()
            .segment(&DynamicImage::ImageRgba8(rgba))
            .unwrap();
        assert_eq!(binary.dimensions(), (80, 60));
        assert!(is_binary(&binary));
    }

    #[test]
    fn test_segment_finds_vessels_and_background() {
        let binary = ImagePreprocessor::new()
            .segment(&DynamicImage::ImageLuma8(vessel_phantom(160, 160)))
            .unwrap();

        let foreground = binary.as_raw().iter().filter(|&&v| v == FOREGROUND).count();
        assert!(foreground > 0);
        assert!(foreground < binary.as_raw().len());
    }

    #[test]
    fn test_segment_is_deterministic() {
        let image = DynamicImage::ImageLuma8(vessel_phantom(90, 70));
        let preprocessor = ImagePreprocessor::new();
        assert_eq!(
            preprocessor.segment(&image).unwrap(),
            preprocessor.segment(&image).unwrap()
        );
    }

    #[test]
    fn test_segment_rejects_empty_image() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(0, 12));
        assert_eq!(
            ImagePreprocessor::new().segment(&image),
            Err(PreprocessingError::EmptyImage {
                width: 0,
                height: 12
            })
        );
    }
}
