use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder};

use crate::error::DecodeError;

/// Encodes a segmented image as an 8-bit grayscale PNG.
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>, DecodeError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::L8,
    )?;
    Ok(bytes)
}

/// `data:` URL for thumbnails in the presentation layer.
pub fn to_data_url(image: &GrayImage) -> Result<String, DecodeError> {
    Ok(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(encode_png(image)?)
    ))
}
