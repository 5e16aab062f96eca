use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::features::{self, DecodeLimits};
use crate::model::ColorModel;

/// Result of one detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// `#rrggbb`, lowercase.
    pub hex: String,
    /// Raw model outputs in [0, 1], before denormalization.
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(skip)]
    pub rgb: Rgb,
}

/// Runs images through the shared feature extractor and a frozen model.
///
/// The model is injected at construction and never mutated afterwards;
/// clones share it through the `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ColorDetector {
    model: Option<Arc<ColorModel>>,
    limits: DecodeLimits,
}

impl ColorDetector {
    pub fn new(model: Arc<ColorModel>) -> ColorDetector {
        ColorDetector { model: Some(model), limits: DecodeLimits::default() }
    }

    /// A detector with no model; every `detect` fails with `ModelNotLoaded`.
    pub fn unloaded() -> ColorDetector {
        ColorDetector { model: None, limits: DecodeLimits::default() }
    }

    /// Rejects images larger than `limits` before decoding them.
    pub fn with_limits(mut self, limits: DecodeLimits) -> ColorDetector {
        self.limits = limits;
        self
    }

    /// Blocking load from a model artifact.
    pub fn load(path: &Path) -> Result<ColorDetector> {
        Ok(ColorDetector::new(Arc::new(ColorModel::load(path)?)))
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Decodes `image_bytes`, predicts, and formats the dominant color.
    pub fn detect(&self, image_bytes: &[u8]) -> Result<Detection> {
        let model = self.model.as_deref().ok_or(Error::ModelNotLoaded)?;
        let input = features::extract_limited(image_bytes, self.limits)?;
        let [r, g, b] = model.predict(&input)?;
        let rgb = Rgb::from_unit([r, g, b]);
        log::debug!("detected {} from {} bytes", rgb, image_bytes.len());
        Ok(Detection { hex: rgb.to_hex(), r, g, b, rgb })
    }
}
