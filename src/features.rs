//! Image → feature vector conversion shared by training and inference.
//!
//! Every image, whatever its resolution or aspect ratio, is resampled to a
//! 32×32 grid, stripped of alpha and flattened row-major as R, G, B, R, G, B, ...
//! with each 8-bit intensity divided by 255. The dataset builder and the
//! detector both go through `extract`, so the model always sees the same layout.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::io::{Limits, Reader};
use image::{DynamicImage, ImageError};

use crate::error::{Error, Result};

/// Side length of the resampled grid.
pub const GRID_SIZE: u32 = 32;
/// Color channels kept per pixel.
pub const CHANNELS: usize = 3;
/// Length of every feature vector: 32 × 32 × 3.
pub const FEATURE_LEN: usize = (GRID_SIZE * GRID_SIZE) as usize * CHANNELS;

/// Largest image side accepted by `extract`.
pub const DEFAULT_MAX_SIDE: u32 = 8192;

// Bilinear; deterministic for identical input.
const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// Upper bounds on the dimensions of an image before it is decoded.
///
/// Checked against the header, so an oversized image is rejected before its
/// pixels are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_width: u32,
    pub max_height: u32,
}

impl DecodeLimits {
    pub fn square(side: u32) -> DecodeLimits {
        DecodeLimits { max_width: side, max_height: side }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits::square(DEFAULT_MAX_SIDE)
    }
}

/// Decodes `bytes` (PNG, JPEG, BMP or GIF) and returns the normalized vector.
pub fn extract(bytes: &[u8]) -> Result<Vec<f64>> {
    extract_limited(bytes, DecodeLimits::default())
}

/// `extract` with caller-chosen dimension limits. Exceeding them is a
/// `Decode` error carrying `ImageError::Limits`.
pub fn extract_limited(bytes: &[u8], limits: DecodeLimits) -> Result<Vec<f64>> {
    let mut reader = Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::Decode(ImageError::IoError(e)))?;
    let mut image_limits = Limits::default();
    image_limits.max_image_width = Some(limits.max_width);
    image_limits.max_image_height = Some(limits.max_height);
    reader.limits(image_limits);
    let img = reader.decode().map_err(Error::Decode)?;
    Ok(extract_image(&img))
}

/// Reads the file at `path` and runs `extract` on its contents.
pub fn extract_file(path: &Path) -> Result<Vec<f64>> {
    let bytes = std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    extract(&bytes)
}

/// Resamples an already decoded image and flattens it.
pub fn extract_image(img: &DynamicImage) -> Vec<f64> {
    let resized = img.resize_exact(GRID_SIZE, GRID_SIZE, RESAMPLE_FILTER);
    let rgb = resized.to_rgb8();
    let mut features = Vec::with_capacity(FEATURE_LEN);
    for pixel in rgb.pixels() {
        features.extend(pixel.0.iter().map(|&c| c as f64 / 255.0));
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .expect("png encoding");
        bytes
    }

    fn solid(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        encode_png(DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color))))
    }

    #[test]
    fn length_is_fixed_for_any_resolution() {
        for (w, h) in [(1, 1), (32, 32), (100, 100), (7, 300), (640, 3)] {
            let features = extract(&solid(w, h, [10, 200, 30])).unwrap();
            assert_eq!(features.len(), FEATURE_LEN, "{}x{}", w, h);
        }
    }

    #[test]
    fn values_are_normalized_intensities() {
        let features = extract(&solid(100, 100, [255, 0, 51])).unwrap();
        assert!(features.iter().all(|&v| (0.0..=1.0).contains(&v)));
        for px in features.chunks(CHANNELS) {
            assert_eq!(px, &[1.0, 0.0, 0.2][..]);
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let mut img = RgbImage::new(57, 91);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgb([(x * 4) as u8, (y * 2) as u8, ((x + y) % 256) as u8]);
        }
        let bytes = encode_png(DynamicImage::ImageRgb8(img));
        assert_eq!(extract(&bytes).unwrap(), extract(&bytes).unwrap());
    }

    #[test]
    fn layout_is_row_major_and_channel_interleaved() {
        // Left half red, right half blue, at exactly grid resolution so no
        // blending happens at the sampled pixels.
        let img = RgbImage::from_fn(GRID_SIZE, GRID_SIZE, |x, _| {
            if x < GRID_SIZE / 2 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let features = extract(&encode_png(DynamicImage::ImageRgb8(img))).unwrap();
        assert_eq!(&features[0..3], &[1.0, 0.0, 0.0]);
        let last_in_row = (GRID_SIZE as usize - 1) * CHANNELS;
        assert_eq!(&features[last_in_row..last_in_row + 3], &[0.0, 0.0, 1.0]);
        let second_row = GRID_SIZE as usize * CHANNELS;
        assert_eq!(&features[second_row..second_row + 3], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn alpha_channel_is_discarded() {
        let opaque = solid(20, 20, [12, 34, 56]);
        let translucent = encode_png(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            20,
            20,
            Rgba([12, 34, 56, 40]),
        )));
        assert_eq!(extract(&opaque).unwrap(), extract(&translucent).unwrap());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = extract(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(matches!(extract(&[]), Err(Error::Decode(_))));
    }

    #[test]
    fn oversized_images_are_rejected_before_decoding() {
        let wide = solid(40, 20, [1, 2, 3]);
        let err = extract_limited(&wide, DecodeLimits::square(32)).unwrap_err();
        assert!(matches!(err, Error::Decode(ImageError::Limits(_))), "{:?}", err);
        let tall = solid(20, 40, [1, 2, 3]);
        assert!(extract_limited(&tall, DecodeLimits::square(32)).is_err());
        assert_eq!(extract_limited(&solid(32, 32, [1, 2, 3]), DecodeLimits::square(32)).unwrap().len(), FEATURE_LEN);
    }
}
