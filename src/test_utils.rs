use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use image::{GrayImage, Luma};

use crate::analysis::types::{Observation, RawObservationInput};
use crate::imaging::operations::FOREGROUND;
use crate::imaging::ImageSource;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn uniform_image(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
}

/// Uneven illumination falling off from the centre, crossed by a few
/// bright vessel-like lines.
pub fn vessel_phantom(width: u32, height: u32) -> GrayImage {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);

    GrayImage::from_fn(width, height, |x, y| {
        let (fx, fy) = (x as f64 / w, y as f64 / h);
        let falloff = ((fx - 0.5).powi(2) + (fy - 0.5).powi(2)).sqrt();
        let illumination = 40.0 + 60.0 * (1.0 - falloff);

        let trunk = (x as i64 - (width / 2) as i64).abs() <= 1;
        let branch = (y as f64 - x as f64 * 0.6 - h * 0.2).abs() < 1.5;
        let arcade = (y as i64 - (height / 3) as i64).abs() <= 1 && x > width / 4;

        let vessel = if trunk || branch || arcade { 90.0 } else { 0.0 };
        Luma([(illumination + vessel).min(255.0) as u8])
    })
}

pub fn date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::days(day as i64)
}

/// Observation with a fixed density and a tiny placeholder segmentation.
pub fn observation(id: &str, day: u32, density: f64) -> Observation {
    let input = RawObservationInput::new(id, date(day), ImageSource::from_raw(2, 2, 1, vec![0; 4]));
    Observation::new(input, Arc::new(uniform_image(2, 2, FOREGROUND)), density)
}
