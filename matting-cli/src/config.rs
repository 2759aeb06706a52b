//! Optional JSON override file for [`matting_core::Parameters`].
//!
//! Mirrors the reference app's config-loading convention
//! (`src/models/config.rs`): every field is optional here and only
//! overwrites the corresponding default when present, so a config file
//! only needs to mention the knobs it actually wants to change.

use std::path::Path;

use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub foreground_threshold: Option<u8>,
    pub background_threshold: Option<u8>,
    pub erode_structure_size: Option<usize>,
    pub band_ratio: Option<f64>,
    pub mid_band: Option<f64>,
    pub eps: Option<f64>,
    pub win_rad: Option<usize>,
    pub trimap_confidence: Option<f64>,
    pub lambda: Option<f64>,
    pub use_entropy: Option<bool>,
}

impl ConfigOverrides {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&self, mut params: matting_core::Parameters) -> matting_core::Parameters {
        if let Some(v) = self.foreground_threshold {
            params.foreground_threshold = v;
        }
        if let Some(v) = self.background_threshold {
            params.background_threshold = v;
        }
        if let Some(v) = self.erode_structure_size {
            params.erode_structure_size = v;
        }
        if let Some(v) = self.band_ratio {
            params.band_ratio = v;
        }
        if let Some(v) = self.mid_band {
            params.mid_band = v;
        }
        if let Some(v) = self.eps {
            params.eps = v;
        }
        if let Some(v) = self.win_rad {
            params.win_rad = v;
        }
        if let Some(v) = self.trimap_confidence {
            params.trimap_confidence = v;
        }
        if let Some(v) = self.lambda {
            params.lambda = v;
        }
        if let Some(v) = self.use_entropy {
            params.use_entropy = v;
        }
        params
    }
}
