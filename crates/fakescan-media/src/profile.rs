//! Classifier input profiles.
//!
//! A profile pins the input resolution and pixel normalization a classifier
//! model was trained with. It is loaded from a JSON sidecar stored next to
//! the model (`<model>.profile.json`) or chosen from the built-in presets,
//! and travels with the classifier so preprocessing can never drift from it.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Pixel value mapping applied before inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Raw 0-255 values (the model normalizes internally)
    Passthrough,
    /// `x / 255`, range [0, 1]
    UnitScale,
    /// `x / 127.5 - 1`, range [-1, 1]
    SignedUnit,
}

impl Normalization {
    #[inline]
    pub fn apply(&self, value: u8) -> f32 {
        let v = value as f32;
        match self {
            Normalization::Passthrough => v,
            Normalization::UnitScale => v / 255.0,
            Normalization::SignedUnit => v / 127.5 - 1.0,
        }
    }
}

/// Memory layout of the input tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[1, height, width, 3]`
    #[default]
    Nhwc,
    /// `[1, 3, height, width]`
    Nchw,
}

/// Input contract of a classifier model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub name: String,
    pub input_width: u32,
    pub input_height: u32,
    pub normalization: Normalization,
    #[serde(default)]
    pub layout: TensorLayout,
}

/// Preprocessed classifier input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl ModelProfile {
    /// 224x224 EfficientNet input with raw 0-255 pixels.
    pub fn efficientnet_224() -> Self {
        Self {
            name: "efficientnet_224".to_string(),
            input_width: 224,
            input_height: 224,
            normalization: Normalization::Passthrough,
            layout: TensorLayout::Nhwc,
        }
    }

    /// 128x128 baseline CNN input with pixels scaled to [0, 1].
    pub fn baseline_128() -> Self {
        Self {
            name: "baseline_128".to_string(),
            input_width: 128,
            input_height: 128,
            normalization: Normalization::UnitScale,
            layout: TensorLayout::Nhwc,
        }
    }

    /// Look up a built-in preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "efficientnet_224" => Some(Self::efficientnet_224()),
            "baseline_128" => Some(Self::baseline_128()),
            _ => None,
        }
    }

    /// Sidecar location for a model file: `face.onnx` -> `face.profile.json`.
    pub fn sidecar_path(model_path: &Path) -> PathBuf {
        model_path.with_extension("profile.json")
    }

    /// Load a profile from a JSON file.
    pub fn load(path: &Path) -> MediaResult<Self> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let profile: ModelProfile = serde_json::from_str(&content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Resolve the profile for `model_path`.
    ///
    /// `explicit` is either a preset name or a path to a profile JSON file.
    /// Without it the sidecar next to the model is required.
    pub fn resolve(explicit: Option<&str>, model_path: &Path) -> MediaResult<Self> {
        if let Some(value) = explicit {
            if let Some(preset) = Self::preset(value) {
                return Ok(preset);
            }
            return Self::load(Path::new(value)).map_err(|e| {
                MediaError::model_unavailable(format!(
                    "profile '{}' is neither a preset nor a readable profile file: {}",
                    value, e
                ))
            });
        }

        let sidecar = Self::sidecar_path(model_path);
        debug!(path = %sidecar.display(), "Looking for model profile sidecar");
        Self::load(&sidecar).map_err(|e| {
            MediaError::model_unavailable(format!(
                "no input profile for {} (expected {}): {}",
                model_path.display(),
                sidecar.display(),
                e
            ))
        })
    }

    pub fn validate(&self) -> MediaResult<()> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(MediaError::model_unavailable(format!(
                "profile '{}' has a zero input dimension",
                self.name
            )));
        }
        Ok(())
    }

    pub fn input_shape(&self) -> Vec<usize> {
        let (w, h) = (self.input_width as usize, self.input_height as usize);
        match self.layout {
            TensorLayout::Nhwc => vec![1, h, w, 3],
            TensorLayout::Nchw => vec![1, 3, h, w],
        }
    }

    /// Resize `face` to the profile resolution and normalize it.
    pub fn preprocess(&self, face: &RgbImage) -> InputTensor {
        let resized = if face.dimensions() == (self.input_width, self.input_height) {
            face.clone()
        } else {
            imageops::resize(face, self.input_width, self.input_height, FilterType::Triangle)
        };

        let (w, h) = (self.input_width as usize, self.input_height as usize);
        let mut data = vec![0.0f32; w * h * 3];

        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                let idx = match self.layout {
                    TensorLayout::Nhwc => (y * w + x) * 3 + c,
                    TensorLayout::Nchw => c * w * h + y * w + x,
                };
                data[idx] = self.normalization.apply(pixel.0[c]);
            }
        }

        InputTensor {
            shape: self.input_shape(),
            data,
        }
    }
}
