//! Image preprocessing filters for OCR
//!
//! Turns a decoded capture into the grayscale image handed to the OCR
//! engine: luminance conversion, edge-preserving bilateral smoothing to
//! suppress compression noise, then a fixed linear contrast boost.
//! Every step is a pure function of its input and settings.

use image::{GrayImage, Luma};
use tracing::debug;

use crate::capture::CaptureImage;
use crate::config::PreprocessingConfig;

/// Normalize a capture for OCR using the given settings
pub fn normalize(frame: &CaptureImage, settings: &PreprocessingConfig) -> GrayImage {
    debug!(
        "OCR preprocessing {}x{}: diameter={}, sigma_color={}, sigma_space={}, alpha={}, beta={}",
        frame.width,
        frame.height,
        settings.diameter,
        settings.sigma_color,
        settings.sigma_space,
        settings.contrast_alpha,
        settings.contrast_beta
    );

    let gray = to_grayscale(frame);
    let mut smoothed = bilateral_filter(&gray, settings.diameter, settings.sigma_color, settings.sigma_space);
    apply_contrast(&mut smoothed, settings.contrast_alpha, settings.contrast_beta);
    smoothed
}

/// Convert RGB data to single-channel luminance
fn to_grayscale(frame: &CaptureImage) -> GrayImage {
    let mut gray = GrayImage::new(frame.width, frame.height);
    for (pixel, rgb) in gray.pixels_mut().zip(frame.data.chunks_exact(3)) {
        // ITU-R BT.601 luma weights
        let luma = 0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32;
        *pixel = Luma([luma.round().clamp(0.0, 255.0) as u8]);
    }
    gray
}

/// Edge-preserving smoothing over a circular neighborhood
///
/// Each output pixel is the average of its neighbors weighted by a spatial
/// Gaussian (`sigma_space`) and an intensity Gaussian (`sigma_color`), so
/// pixels across a strong edge contribute almost nothing. Borders are
/// mirrored without repeating the edge pixel.
fn bilateral_filter(src: &GrayImage, diameter: u32, sigma_color: f32, sigma_space: f32) -> GrayImage {
    let (width, height) = src.dimensions();
    if width == 0 || height == 0 {
        return src.clone();
    }

    let radius = (diameter / 2) as i64;
    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    let color_weights: Vec<f32> = (0..256u32)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist_sq = (dx * dx + dy * dy) as f32;
            if dist_sq.sqrt() > radius as f32 {
                continue;
            }
            offsets.push((dx, dy, (dist_sq * space_coeff).exp()));
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let center = src.get_pixel(x, y)[0];
            let mut sum = 0.0f32;
            let mut norm = 0.0f32;

            for &(dx, dy, space_weight) in &offsets {
                let sx = reflect_101(x as i64 + dx, width);
                let sy = reflect_101(y as i64 + dy, height);
                let value = src.get_pixel(sx, sy)[0];
                let weight = space_weight * color_weights[center.abs_diff(value) as usize];
                sum += weight * value as f32;
                norm += weight;
            }

            // norm >= 1: the center offset always has weight 1
            out.put_pixel(x, y, Luma([(sum / norm).round().clamp(0.0, 255.0) as u8]));
        }
    }

    out
}

/// Mirror an out-of-range coordinate back into `0..len` (`dcb|abcd|cba`)
fn reflect_101(index: i64, len: u32) -> u32 {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let mut folded = index.rem_euclid(period);
    if folded >= len {
        folded = period - folded;
    }
    folded as u32
}

/// Linear contrast: `|v * alpha + beta|`, rounded and clipped to 0-255
fn apply_contrast(image: &mut GrayImage, alpha: f32, beta: f32) {
    for pixel in image.pixels_mut() {
        let adjusted = (pixel[0] as f32 * alpha + beta).abs().round().clamp(0.0, 255.0);
        pixel[0] = adjusted as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> CaptureImage {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        CaptureImage::new(data, width, height)
    }

    fn gray_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)]))
    }

    #[test]
    fn test_grayscale() {
        let frame = frame_from_fn(2, 1, |x, _| if x == 0 { [255, 0, 0] } else { [255, 255, 255] });
        let gray = to_grayscale(&frame);
        // 0.299 * 255 = 76.245
        assert_eq!(gray.get_pixel(0, 0)[0], 76);
        assert_eq!(gray.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_contrast_boost_and_clip() {
        let mut image = gray_from_fn(3, 1, |x, _| [0, 100, 220][x as usize]);
        apply_contrast(&mut image, 1.2, 10.0);
        assert_eq!(image.get_pixel(0, 0)[0], 10);
        assert_eq!(image.get_pixel(1, 0)[0], 130);
        // 220 * 1.2 + 10 = 274 -> clipped
        assert_eq!(image.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-3, 5), 3);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-2, 1), 0);
    }

    #[test]
    fn test_bilateral_keeps_flat_regions() {
        let image = gray_from_fn(9, 9, |_, _| 128);
        let filtered = bilateral_filter(&image, 7, 50.0, 50.0);
        assert!(filtered.pixels().all(|p| p[0] == 128));
    }

    #[test]
    fn test_bilateral_preserves_hard_edges() {
        let image = gray_from_fn(10, 6, |x, _| if x < 5 { 0 } else { 255 });
        let filtered = bilateral_filter(&image, 7, 50.0, 50.0);
        for y in 0..6 {
            assert_eq!(filtered.get_pixel(4, y)[0], 0);
            assert_eq!(filtered.get_pixel(5, y)[0], 255);
        }
    }

    #[test]
    fn test_bilateral_smooths_small_noise() {
        let image = gray_from_fn(7, 7, |x, y| if x == 3 && y == 3 { 120 } else { 100 });
        let filtered = bilateral_filter(&image, 7, 50.0, 50.0);
        let center = filtered.get_pixel(3, 3)[0];
        assert!(center > 100 && center < 120, "center was {}", center);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let frame = frame_from_fn(16, 8, |x, y| [(x * 13 % 256) as u8, (y * 29 % 256) as u8, ((x + y) * 7 % 256) as u8]);
        let settings = PreprocessingConfig::default();

        let first = normalize(&frame, &settings);
        let second = normalize(&frame, &settings);
        assert_eq!(first.dimensions(), (16, 8));
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_normalize_empty_image() {
        let frame = CaptureImage::new(Vec::new(), 0, 0);
        let result = normalize(&frame, &PreprocessingConfig::default());
        assert_eq!(result.dimensions(), (0, 0));
    }
}
