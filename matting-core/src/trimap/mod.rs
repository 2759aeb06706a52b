//! Trimap construction.
//!
//! [`TrimapBuilder`] converts a soft mask or probability map into a
//! three-valued trimap with a guaranteed uncertainty band, in either of
//! the two modes from `spec.md` §4.C. Both are ported from the Python
//! reference (`examples/original_source/rembg/bg.py` /
//! `src/python/main.py` for threshold mode,
//! `examples/original_source/src/python/process_matting.py`'s
//! `entropy_trimap` for entropy mode).

mod edges;

use crate::api::MattingError;
use crate::morph::{dilate_disk, erode_square, BorderValue};
use crate::types::{Mask, Trimap};

/// Default foreground threshold (`spec.md` §6): mask value above which a
/// pixel is definite foreground, as an 8-bit level.
pub const DEFAULT_FOREGROUND_THRESHOLD: u8 = 240;

/// Default background threshold, as an 8-bit level.
pub const DEFAULT_BACKGROUND_THRESHOLD: u8 = 10;

/// Default square erosion structuring element side length.
pub const DEFAULT_ERODE_STRUCTURE_SIZE: usize = 10;

/// Default minimum uncertainty band width, as a fraction of `min(H, W)`.
pub const DEFAULT_BAND_RATIO: f64 = 0.01;

/// Default half-width of the probability mid-band forced to unknown.
pub const DEFAULT_MID_BAND: f64 = 0.2;

/// Builds a three-valued trimap from a probability/mask map.
#[derive(Debug, Clone, Copy)]
pub struct TrimapBuilder {
    foreground_threshold: u8,
    background_threshold: u8,
    erode_structure_size: usize,
    band_ratio: f64,
    mid_band: f64,
}

impl Default for TrimapBuilder {
    fn default() -> Self {
        Self {
            foreground_threshold: DEFAULT_FOREGROUND_THRESHOLD,
            background_threshold: DEFAULT_BACKGROUND_THRESHOLD,
            erode_structure_size: DEFAULT_ERODE_STRUCTURE_SIZE,
            band_ratio: DEFAULT_BAND_RATIO,
            mid_band: DEFAULT_MID_BAND,
        }
    }
}

impl TrimapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the foreground/background 8-bit thresholds (threshold mode).
    pub fn thresholds(mut self, foreground: u8, background: u8) -> Result<Self, MattingError> {
        if foreground <= background {
            return Err(MattingError::InvalidParameter {
                name: "foreground_threshold",
                detail: format!(
                    "foreground_threshold ({foreground}) must be greater than background_threshold ({background})"
                ),
            });
        }
        self.foreground_threshold = foreground;
        self.background_threshold = background;
        Ok(self)
    }

    /// Set the square erosion structuring element side length (threshold mode).
    pub fn erode_structure_size(mut self, size: usize) -> Self {
        self.erode_structure_size = size;
        self
    }

    /// Set the minimum uncertainty band ratio (entropy mode).
    pub fn band_ratio(mut self, ratio: f64) -> Result<Self, MattingError> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(MattingError::InvalidParameter {
                name: "band_ratio",
                detail: format!("must be in (0, 1], got {ratio}"),
            });
        }
        self.band_ratio = ratio;
        Ok(self)
    }

    /// Set the probability mid-band half-width (entropy mode).
    pub fn mid_band(mut self, half_width: f64) -> Result<Self, MattingError> {
        if !(0.0..0.5).contains(&half_width) {
            return Err(MattingError::InvalidParameter {
                name: "mid_band",
                detail: format!("must be in [0, 0.5), got {half_width}"),
            });
        }
        self.mid_band = half_width;
        Ok(self)
    }

    /// Threshold-mode trimap: erode the foreground/background sets that
    /// pass the foreground/background thresholds, everything else is
    /// unknown.
    #[tracing::instrument(level = "debug", skip(self, mask))]
    pub fn build_threshold(&self, mask: &Mask) -> Trimap {
        let height = mask.height();
        let width = mask.width();
        let fg_t = self.foreground_threshold as f64 / 255.0;
        let bg_t = self.background_threshold as f64 / 255.0;

        let is_fg: Vec<bool> = mask.as_slice().iter().map(|&v| v > fg_t).collect();
        let is_bg: Vec<bool> = mask.as_slice().iter().map(|&v| v < bg_t).collect();

        let (is_fg, is_bg) = if self.erode_structure_size > 0 {
            (
                erode_square(
                    &is_fg,
                    height,
                    width,
                    self.erode_structure_size,
                    BorderValue::Zero,
                ),
                // "border value = 1": pixels outside the raster count as
                // background, so background touching the image border is
                // not falsely shrunk.
                erode_square(
                    &is_bg,
                    height,
                    width,
                    self.erode_structure_size,
                    BorderValue::One,
                ),
            )
        } else {
            (is_fg, is_bg)
        };

        let mut data = vec![0.5; height * width];
        for i in 0..data.len() {
            if is_bg[i] {
                data[i] = 0.0;
            } else if is_fg[i] {
                data[i] = 1.0;
            }
        }

        let unknown = data.iter().filter(|&&v| v == 0.5).count();
        tracing::debug!(unknown, "threshold trimap built");

        Trimap::from_quantized(data, height, width)
    }

    /// Entropy-mode trimap: label by distance from `0.5`, then force a
    /// geometric band around every fg/bg boundary to "unknown" so the
    /// unknown region is guaranteed to be a superset of the true
    /// fractional-alpha region (`spec.md` §3 invariant).
    #[tracing::instrument(level = "debug", skip(self, prob))]
    pub fn build_entropy(&self, prob: &Mask) -> Trimap {
        let height = prob.height();
        let width = prob.width();

        let mut fg = vec![false; height * width];
        let mut bg = vec![false; height * width];
        for (i, &p) in prob.as_slice().iter().enumerate() {
            if p >= 0.5 + self.mid_band {
                fg[i] = true;
            } else if p <= 0.5 - self.mid_band {
                bg[i] = true;
            }
        }
        let mut unknown: Vec<bool> = (0..fg.len()).map(|i| !(fg[i] || bg[i])).collect();

        // Label image: 2 = fg, 1 = bg, 0 = unknown, used purely to find
        // boundaries between disagreeing neighbors.
        let labels: Vec<u8> = (0..fg.len())
            .map(|i| {
                if fg[i] {
                    2
                } else if bg[i] {
                    1
                } else {
                    0
                }
            })
            .collect();
        let edge_pixels = edges::label_edges(&labels, height, width);

        let band_px = ((height.min(width) as f64) * self.band_ratio).round().max(1.0) as usize;
        let dilated_edges = dilate_disk(&edge_pixels, height, width, band_px);

        for (i, forced) in dilated_edges.into_iter().enumerate() {
            if forced {
                unknown[i] = true;
            }
        }

        let mut data = vec![0.5; height * width];
        for i in 0..data.len() {
            if unknown[i] {
                data[i] = 0.5;
            } else if fg[i] {
                data[i] = 1.0;
            } else {
                data[i] = 0.0;
            }
        }

        let unknown_count = data.iter().filter(|&&v| v == 0.5).count();
        tracing::debug!(band_px, unknown_count, "entropy trimap built");

        Trimap::from_quantized(data, height, width)
    }
}
