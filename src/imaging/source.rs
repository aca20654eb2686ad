use std::path::PathBuf;

use enum_dispatch::enum_dispatch;
use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageReader, RgbImage, RgbaImage};
use log::debug;

use crate::error::{AnalysisError, DecodeError, PreprocessingError};

/// Encoded file contents held in memory, e.g. from an upload or drag and drop.
#[derive(Clone, Debug)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct ImageFile {
    pub path: PathBuf,
}

/// Interleaved 8-bit pixels that were decoded elsewhere.
#[derive(Clone, Debug)]
pub struct RawPixels {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Preloaded(pub DynamicImage);

#[enum_dispatch(LoadImage)]
#[derive(Clone, Debug)]
pub enum ImageSource {
    EncodedImage(EncodedImage),
    ImageFile(ImageFile),
    RawPixels(RawPixels),
    Preloaded(Preloaded),
}

#[enum_dispatch]
pub trait LoadImage {
    fn load(&self) -> Result<DynamicImage, AnalysisError>;
}

impl ImageSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        EncodedImage {
            bytes: bytes.into(),
        }
        .into()
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ImageFile { path: path.into() }.into()
    }

    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Self {
        RawPixels {
            width,
            height,
            channels,
            data,
        }
        .into()
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        ImageSource::Preloaded(Preloaded(image))
    }
}

impl LoadImage for EncodedImage {
    fn load(&self) -> Result<DynamicImage, AnalysisError> {
        debug!("Decoding {} encoded bytes", self.bytes.len());
        let image = image::load_from_memory(&self.bytes).map_err(DecodeError::from)?;
        Ok(image)
    }
}

impl LoadImage for ImageFile {
    fn load(&self) -> Result<DynamicImage, AnalysisError> {
        debug!("Decoding image file {}", self.path.display());
        let io_error = |source| DecodeError::Io {
            path: self.path.clone(),
            source,
        };
        let image = ImageReader::open(&self.path)
            .map_err(io_error)?
            .with_guessed_format()
            .map_err(io_error)?
            .decode()
            .map_err(DecodeError::from)?;
        Ok(image)
    }
}

impl LoadImage for RawPixels {
    fn load(&self) -> Result<DynamicImage, AnalysisError> {
        if !(1..=4).contains(&self.channels) {
            return Err(PreprocessingError::UnsupportedChannels(self.channels).into());
        }

        let expected = self.width as usize * self.height as usize * self.channels as usize;
        if self.data.len() != expected {
            return Err(DecodeError::BufferSize {
                expected,
                actual: self.data.len(),
            }
            .into());
        }

        let (width, height, data) = (self.width, self.height, self.data.clone());
        let size_error = || DecodeError::BufferSize {
            expected,
            actual: expected,
        };
        let image = match self.channels {
            1 => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
            2 => GrayAlphaImage::from_raw(width, height, data).map(DynamicImage::ImageLumaA8),
            3 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
            _ => RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
        };

        Ok(image.ok_or_else(size_error)?)
    }
}

impl LoadImage for Preloaded {
    fn load(&self) -> Result<DynamicImage, AnalysisError> {
        Ok(self.0.clone())
    }
}
