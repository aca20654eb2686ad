use image::{DynamicImage, GrayImage, Luma};
use rayon::prelude::*;

pub const CLAHE_CLIP_LIMIT: f64 = 2.0;
pub const CLAHE_TILE_GRID: u32 = 8;
pub const BLUR_KERNEL_SIZE: usize = 5;
pub const BLUR_SIGMA: f64 = 1.4;
pub const THRESHOLD_BLOCK_SIZE: usize = 11;
pub const THRESHOLD_OFFSET: f64 = 2.0;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

const BINS: usize = 256;

type Histogram = [u32; BINS];
type Lut = [u8; BINS];

/// BT.601 luma. Single-channel 8-bit images pass through unchanged.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
            image.to_luma8()
        }
        _ => {
            let rgba = image.to_rgba8();
            GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                let [r, g, b, _] = rgba.get_pixel(x, y).0;
                Luma([bt601_luma(r, g, b)])
            })
        }
    }
}

fn bt601_luma(r: u8, g: u8, b: u8) -> u8 {
    saturate_u8(0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64)
}

fn saturate_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Mirror index without repeating the edge pixel: `dcb|abcd|cba`.
pub fn reflect_101(index: usize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * len - 2;
    let m = index % period;
    if m >= len {
        period - m
    } else {
        m
    }
}

/// Clamp to the edge pixel. Used for both blurs; an OpenCV `BORDER_DEFAULT`
/// blur would mirror with `reflect_101` instead, so edge pixels may differ.
fn replicate(index: i64, len: usize) -> usize {
    index.clamp(0, len as i64 - 1) as usize
}

pub fn calculate_histogram(vals: impl IntoIterator<Item = u8>) -> Histogram {
    vals.into_iter().fold([0; BINS], |mut histogram, value| {
        histogram[value as usize] += 1;
        histogram
    })
}

/// Caps every bin at `limit` and hands the excess back out evenly, with the
/// remainder spread at a fixed stride from bin 0.
pub fn clip_histogram(histogram: &mut Histogram, limit: u32) {
    let mut clipped = 0;
    for count in histogram.iter_mut() {
        if *count > limit {
            clipped += *count - limit;
            *count = limit;
        }
    }

    let batch = clipped / BINS as u32;
    let mut residual = clipped as usize - batch as usize * BINS;
    histogram.iter_mut().for_each(|count| *count += batch);

    if residual > 0 {
        let step = (BINS / residual).max(1);
        let mut i = 0;
        while i < BINS && residual > 0 {
            histogram[i] += 1;
            i += step;
            residual -= 1;
        }
    }
}

fn create_lut(histogram: &Histogram, pixel_count: usize) -> Lut {
    let scale = 255.0 / pixel_count as f64;
    let mut lut = [0u8; BINS];
    let mut cdf = 0u32;

    for (entry, &count) in lut.iter_mut().zip(histogram.iter()) {
        cdf += count;
        *entry = saturate_u8(cdf as f64 * scale);
    }

    lut
}

/// Lower tile, upper tile and weight of the upper tile for a pixel position.
fn interpolation_cell(pos: usize, inv_tile: f64, tiles: usize) -> (usize, usize, f64) {
    let f = pos as f64 * inv_tile - 0.5;
    let lower = f.floor();
    let weight = f - lower;
    let lower = lower as i64;

    let t1 = lower.max(0) as usize;
    let t2 = (lower + 1).min(tiles as i64 - 1) as usize;
    (t1, t2, weight)
}

/// Contrast limited adaptive histogram equalization over a `grid` x `grid`
/// arrangement of tiles, bilinearly blended between neighbouring tile LUTs.
pub fn clahe(image: &GrayImage, clip_limit: f64, grid: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let (w, h) = (width as usize, height as usize);
    let tiles = grid.max(1) as usize;
    let tile_w = w.div_ceil(tiles);
    let tile_h = h.div_ceil(tiles);
    let tile_area = tile_w * tile_h;

    let limit = if clip_limit > 0.0 {
        ((clip_limit * tile_area as f64 / BINS as f64) as u32).max(1)
    } else {
        u32::MAX
    };

    let src = image.as_raw();

    let luts: Vec<Lut> = (0..tiles * tiles)
        .into_par_iter()
        .map(|t| {
            let (tx, ty) = (t % tiles, t / tiles);
            let values = (ty * tile_h..(ty + 1) * tile_h).flat_map(move |y| {
                let row = reflect_101(y, h) * w;
                (tx * tile_w..(tx + 1) * tile_w).map(move |x| src[row + reflect_101(x, w)])
            });

            let mut histogram = calculate_histogram(values);
            clip_histogram(&mut histogram, limit);
            create_lut(&histogram, tile_area)
        })
        .collect();

    let inv_tw = 1.0 / tile_w as f64;
    let inv_th = 1.0 / tile_h as f64;
    let columns: Vec<(usize, usize, f64)> = (0..w)
        .map(|x| interpolation_cell(x, inv_tw, tiles))
        .collect();

    let mut enhanced = GrayImage::new(width, height);
    let dst: &mut [u8] = &mut enhanced;

    dst.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let (ty1, ty2, ya) = interpolation_cell(y, inv_th, tiles);

        for (x, value) in row.iter_mut().enumerate() {
            let (tx1, tx2, xa) = columns[x];
            let pixel = src[y * w + x] as usize;
            let lut = |tx: usize, ty: usize| luts[ty * tiles + tx][pixel] as f64;

            let top = lut(tx1, ty1) * (1.0 - xa) + lut(tx2, ty1) * xa;
            let bottom = lut(tx1, ty2) * (1.0 - xa) + lut(tx2, ty2) * xa;
            *value = saturate_u8(top * (1.0 - ya) + bottom * ya);
        }
    });

    enhanced
}

/// Sampled, normalised 1D Gaussian of `size` taps centred on the middle tap.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    let center = (size / 2) as f64;
    let denom = 2.0 * sigma * sigma;

    let mut kernel: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-d * d / denom).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// Sigma implied by a kernel size when none is given.
pub fn sigma_for_kernel(size: usize) -> f64 {
    0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Separable Gaussian smoothing, replicating edge pixels past the border.
pub fn gaussian_blur(image: &GrayImage, size: usize, sigma: f64) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let (w, h) = (width as usize, height as usize);
    let kernel = gaussian_kernel(size, sigma);
    let radius = (size / 2) as i64;
    let src = image.as_raw();

    let mut horizontal = vec![0f64; w * h];
    horizontal
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[y * w..(y + 1) * w];
            for (x, value) in row.iter_mut().enumerate() {
                *value = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, weight)| {
                        weight * src_row[replicate(x as i64 + k as i64 - radius, w)] as f64
                    })
                    .sum();
            }
        });

    let mut blurred = GrayImage::new(width, height);
    let dst: &mut [u8] = &mut blurred;

    dst.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, value) in row.iter_mut().enumerate() {
            let sum: f64 = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    weight * horizontal[replicate(y as i64 + k as i64 - radius, h) * w + x]
                })
                .sum();
            *value = saturate_u8(sum);
        }
    });

    blurred
}

/// Binary threshold against a Gaussian-weighted local mean: a pixel is
/// foreground when it exceeds its neighbourhood mean minus `offset`.
pub fn adaptive_threshold(image: &GrayImage, block_size: usize, offset: f64) -> GrayImage {
    let local_mean = gaussian_blur(image, block_size, sigma_for_kernel(block_size));
    let delta = offset.ceil() as i32;

    let mut binary = GrayImage::new(image.width(), image.height());
    let dst: &mut [u8] = &mut binary;

    dst.par_iter_mut()
        .zip(image.as_raw().par_iter())
        .zip(local_mean.as_raw().par_iter())
        .for_each(|((value, &src), &mean)| {
            *value = if src as i32 - mean as i32 > -delta {
                FOREGROUND
            } else {
                BACKGROUND
            };
        });

    binary
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;
    use crate::test_utils::{uniform_image, vessel_phantom};

    #[test]
    fn test_grayscale_uses_bt601_weights() {
        let mut rgb = RgbImage::new(3, 1);
        rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, Rgb([0, 255, 0]));
        rgb.put_pixel(2, 0, Rgb([0, 0, 255]));

        let gray = to_grayscale(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(gray.as_raw(), &vec![76, 150, 29]);
    }

    #[test]
    fn test_grayscale_passes_luma_through() {
        let phantom = vessel_phantom(20, 10);
        let gray = to_grayscale(&DynamicImage::ImageLuma8(phantom.clone()));
        assert_eq!(gray, phantom);
    }

    #[test]
    fn test_reflect_101() {
        let mirrored: Vec<usize> = (0..8).map(|i| reflect_101(i, 4)).collect();
        assert_eq!(mirrored, vec![0, 1, 2, 3, 2, 1, 0, 1]);
        assert_eq!(reflect_101(7, 1), 0);
    }

    #[test]
    fn test_calculate_histogram() {
        let histogram = calculate_histogram([1u8, 2, 1, 3, 2, 2, 255]);
        assert_eq!(histogram[1], 2);
        assert_eq!(histogram[2], 3);
        assert_eq!(histogram[3], 1);
        assert_eq!(histogram[255], 1);
        assert_eq!(histogram.iter().sum::<u32>(), 7);
    }

    #[test]
    fn test_clip_histogram_preserves_total() {
        let mut histogram = [0u32; BINS];
        histogram[10] = 900;
        histogram[20] = 124;

        clip_histogram(&mut histogram, 8);

        assert_eq!(histogram.iter().sum::<u32>(), 1024);
        assert!(histogram.iter().all(|&c| c <= 8 + 4));
    }

    #[test]
    fn test_uniform_histogram_lut_is_identity() {
        let histogram = [1u32; BINS];
        let lut = create_lut(&histogram, BINS);
        for (i, &value) in lut.iter().enumerate() {
            assert!((value as i32 - i as i32).abs() <= 1, "LUT value at index {} is {}", i, value);
        }
        assert_eq!(lut[255], 255);
    }

    #[test]
    fn test_clahe_stretches_low_contrast() {
        let image = GrayImage::from_fn(256, 256, |x, _| Luma([100 + (x % 16) as u8]));
        let enhanced = clahe(&image, CLAHE_CLIP_LIMIT, CLAHE_TILE_GRID);

        assert_eq!(enhanced.dimensions(), image.dimensions());
        let min = *enhanced.as_raw().iter().min().unwrap();
        let max = *enhanced.as_raw().iter().max().unwrap();
        assert!(max - min > 15, "range {}..{} was not stretched", min, max);
    }

    #[test]
    fn test_clahe_handles_indivisible_and_tiny_sizes() {
        for (w, h) in [(13, 7), (1, 1), (3, 50), (100, 2)] {
            let enhanced = clahe(&vessel_phantom(w, h), CLAHE_CLIP_LIMIT, CLAHE_TILE_GRID);
            assert_eq!(enhanced.dimensions(), (w, h));
        }
    }

    #[test]
    fn test_gaussian_kernel() {
        let kernel = gaussian_kernel(BLUR_KERNEL_SIZE, BLUR_SIGMA);
        assert_eq!(kernel.len(), 5);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((kernel[0] - kernel[4]).abs() < 1e-12);
        assert!((kernel[1] - kernel[3]).abs() < 1e-12);
        assert!(kernel[2] > kernel[1] && kernel[1] > kernel[0]);
    }

    #[test]
    fn test_sigma_for_threshold_block() {
        assert!((sigma_for_kernel(THRESHOLD_BLOCK_SIZE) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_blur_keeps_flat_image() {
        let image = uniform_image(17, 9, 133);
        assert_eq!(gaussian_blur(&image, BLUR_KERNEL_SIZE, BLUR_SIGMA), image);
    }

    #[test]
    fn test_gaussian_blur_spreads_impulse() {
        let mut image = uniform_image(9, 9, 0);
        image.put_pixel(4, 4, Luma([255]));

        let blurred = gaussian_blur(&image, BLUR_KERNEL_SIZE, BLUR_SIGMA);
        let center = blurred.get_pixel(4, 4)[0];
        assert!(center < 255 && center > 0);
        assert!(blurred.get_pixel(5, 4)[0] > 0);
        assert_eq!(blurred.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_adaptive_threshold_flat_image_is_foreground() {
        let binary = adaptive_threshold(&uniform_image(12, 12, 80), THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET);
        assert!(binary.as_raw().iter().all(|&v| v == FOREGROUND));
    }

    #[test]
    fn test_adaptive_threshold_separates_bright_line() {
        let mut image = uniform_image(21, 21, 40);
        for y in 0..21 {
            image.put_pixel(10, y, Luma([200]));
        }

        let binary = adaptive_threshold(&image, THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET);
        assert_eq!(binary.get_pixel(10, 10)[0], FOREGROUND);
        assert_eq!(binary.get_pixel(11, 10)[0], BACKGROUND);
        assert_eq!(binary.get_pixel(9, 10)[0], BACKGROUND);
        assert!(binary.as_raw().iter().all(|&v| v == FOREGROUND || v == BACKGROUND));
    }
}
