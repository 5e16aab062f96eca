//! Synthetic training swatches.
//!
//! Each swatch is written as a PNG named after its dominant color, which is
//! exactly the contract `Dataset::build` reads back.

use std::path::{Path, PathBuf};

use image::{Rgb as Pixel, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color::Rgb;
use crate::error::{Error, Result};

/// Side length used when no size is requested.
pub const DEFAULT_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swatch {
    Solid(Rgb),
    /// Vertical blend from `start` (top row) to `end` (bottom row).
    Gradient { start: Rgb, end: Rgb },
}

impl Swatch {
    pub fn render(&self, width: u32, height: u32) -> RgbImage {
        match *self {
            Swatch::Solid(c) => RgbImage::from_pixel(width, height, Pixel([c.r, c.g, c.b])),
            Swatch::Gradient { start, end } => {
                let mut img = RgbImage::new(width, height);
                for y in 0..height {
                    let c = row_color(start, end, y, height);
                    for x in 0..width {
                        img.put_pixel(x, y, Pixel([c.r, c.g, c.b]));
                    }
                }
                img
            }
        }
    }

    /// Mean color of the rendered image, rounded per channel.
    ///
    /// Gradients are averaged over their actual rows so the label matches
    /// the pixels, not the endpoints.
    pub fn dominant(&self, height: u32) -> Rgb {
        match *self {
            Swatch::Solid(c) => c,
            Swatch::Gradient { start, end } => {
                let height = height.max(1);
                let mut sum = [0u64; 3];
                for y in 0..height {
                    let c = row_color(start, end, y, height);
                    sum[0] += c.r as u64;
                    sum[1] += c.g as u64;
                    sum[2] += c.b as u64;
                }
                let n = height as f64;
                Rgb::new(
                    (sum[0] as f64 / n).round() as u8,
                    (sum[1] as f64 / n).round() as u8,
                    (sum[2] as f64 / n).round() as u8,
                )
            }
        }
    }

    /// `rrggbb.png` for the dominant color at the given height.
    pub fn file_name(&self, height: u32) -> String {
        let hex = self.dominant(height).to_hex();
        format!("{}.png", hex.trim_start_matches('#'))
    }
}

fn row_color(start: Rgb, end: Rgb, y: u32, height: u32) -> Rgb {
    let ratio = if height > 1 { y as f64 / (height - 1) as f64 } else { 0.0 };
    Rgb::new(
        lerp(start.r, end.r, ratio),
        lerp(start.g, end.g, ratio),
        lerp(start.b, end.b, ratio),
    )
}

fn lerp(start: u8, end: u8, ratio: f64) -> u8 {
    (start as f64 + (end as f64 - start as f64) * ratio).round() as u8
}

/// The stock palette: primaries, three accent solids and three gradients.
pub fn default_set() -> Vec<Swatch> {
    let c = |hex: u32| Rgb::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8);
    vec![
        Swatch::Solid(c(0xff0000)),
        Swatch::Solid(c(0x00ff00)),
        Swatch::Solid(c(0x0000ff)),
        Swatch::Gradient { start: c(0x0000ff), end: c(0xffffff) },
        Swatch::Solid(c(0x673ab7)),
        Swatch::Gradient { start: c(0xffa500), end: c(0x000000) },
        Swatch::Solid(c(0x40e0d0)),
        Swatch::Gradient { start: c(0xffb6c1), end: c(0x0000ff) },
    ]
}

/// `count` uniformly random solid swatches.
pub fn random_solids(count: usize, seed: Option<u64>) -> Vec<Swatch> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    (0..count)
        .map(|_| Swatch::Solid(Rgb::new(rng.gen(), rng.gen(), rng.gen())))
        .collect()
}

/// Renders every swatch at `size`×`size` into `directory` and returns the
/// written paths. Swatches sharing a dominant color overwrite each other.
pub fn write_all(directory: &Path, swatches: &[Swatch], size: u32) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(directory)?;
    let mut written = Vec::with_capacity(swatches.len());
    for swatch in swatches {
        let path = directory.join(swatch.file_name(size));
        swatch.render(size, size).save(&path).map_err(Error::Encode)?;
        log::debug!("wrote {:?} to {}", swatch, path.display());
        written.push(path);
    }
    log::info!("generated {} swatches in {}", written.len(), directory.display());
    Ok(written)
}
