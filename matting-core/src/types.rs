//! Pixel buffer types shared across the pipeline.
//!
//! This module provides the owned, dimension-checked buffers that flow
//! between components: [`Image`] (float RGB), [`Mask`] (float single
//! channel), [`Trimap`] (three-valued), [`Alpha`] (the solved opacity
//! map) and [`Foreground`] (the unmixed color layer).
//!
//! Everything here is `f64` end to end; only the host-facing RGBA codec
//! at the edges touches `u8`.

use crate::api::MattingError;

/// A color image in `[0,1]`, row-major, RGB, `f64`.
///
/// Backing storage is `height * width * 3` samples, laid out
/// `[y*width*3 + x*3 + c]`.
#[derive(Debug, Clone)]
pub struct Image {
    data: Vec<f64>,
    height: usize,
    width: usize,
}

impl Image {
    /// Build an image from a flat `height*width*3` buffer.
    pub fn from_vec(data: Vec<f64>, height: usize, width: usize) -> Result<Self, MattingError> {
        let expected = height * width * 3;
        if data.len() != expected {
            return Err(MattingError::InvalidDimensions {
                detail: format!(
                    "image buffer length {} does not match height*width*3 = {expected}",
                    data.len()
                ),
            });
        }
        Ok(Self {
            data,
            height,
            width,
        })
    }

    /// Decode an interleaved 8-bit RGBA buffer, discarding the alpha byte.
    ///
    /// Matches the external buffer convention from `spec.md` §6: the RGB
    /// bytes are the image, the alpha byte is interpreted separately by
    /// the caller as the trimap probability.
    pub fn from_rgba8(rgba: &[u8], height: usize, width: usize) -> Result<Self, MattingError> {
        let expected = height * width * 4;
        if rgba.len() != expected {
            return Err(MattingError::InvalidDimensions {
                detail: format!(
                    "rgba buffer length {} does not match height*width*4 = {expected}",
                    rgba.len()
                ),
            });
        }
        let mut data = Vec::with_capacity(height * width * 3);
        for px in rgba.chunks_exact(4) {
            data.push(px[0] as f64 / 255.0);
            data.push(px[1] as f64 / 255.0);
            data.push(px[2] as f64 / 255.0);
        }
        Self::from_vec(data, height, width)
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Fetch the RGB triple at `(y, x)`.
    #[inline]
    pub fn pixel(&self, y: usize, x: usize) -> [f64; 3] {
        let base = (y * self.width + x) * 3;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }

    /// Fetch the RGB triple at raveled index `y * width + x`.
    #[inline]
    pub fn pixel_at(&self, idx: usize) -> [f64; 3] {
        let base = idx * 3;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }
}

/// A single-channel probability/confidence map in `[0,1]`.
#[derive(Debug, Clone)]
pub struct Mask {
    data: Vec<f64>,
    height: usize,
    width: usize,
}

impl Mask {
    pub fn from_vec(data: Vec<f64>, height: usize, width: usize) -> Result<Self, MattingError> {
        let expected = height * width;
        if data.len() != expected {
            return Err(MattingError::InvalidDimensions {
                detail: format!(
                    "mask buffer length {} does not match height*width = {expected}",
                    data.len()
                ),
            });
        }
        Ok(Self {
            data,
            height,
            width,
        })
    }

    /// Decode a mask from the alpha channel of an interleaved 8-bit RGBA
    /// buffer (0 = background-like, 255 = foreground-like).
    pub fn from_rgba8_alpha(
        rgba: &[u8],
        height: usize,
        width: usize,
    ) -> Result<Self, MattingError> {
        let expected = height * width * 4;
        if rgba.len() != expected {
            return Err(MattingError::InvalidDimensions {
                detail: format!(
                    "rgba buffer length {} does not match height*width*4 = {expected}",
                    rgba.len()
                ),
            });
        }
        let data = rgba
            .chunks_exact(4)
            .map(|px| px[3] as f64 / 255.0)
            .collect();
        Self::from_vec(data, height, width)
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn get(&self, y: usize, x: usize) -> f64 {
        self.data[y * self.width + x]
    }
}

/// The three-valued trimap: `0.0` = definite background, `1.0` = definite
/// foreground, `0.5` = unknown.
#[derive(Debug, Clone)]
pub struct Trimap {
    data: Vec<f64>,
    height: usize,
    width: usize,
}

impl Trimap {
    /// Build a trimap, snapping every value to the nearest of `{0, 0.5, 1}`.
    ///
    /// A caller-supplied trimap (e.g. from the CLI's RGBA alpha channel,
    /// already pre-quantized to 0/128/255 by an upstream segmenter) is
    /// not trusted to be perfectly on-grid; this mirrors the Python
    /// reference's tolerant known-pixel test (`trimap < 0.1 | trimap >
    /// 0.9`) rather than an exact equality check.
    pub fn from_raw(data: Vec<f64>, height: usize, width: usize) -> Result<Self, MattingError> {
        let expected = height * width;
        if data.len() != expected {
            return Err(MattingError::InvalidDimensions {
                detail: format!(
                    "trimap buffer length {} does not match height*width = {expected}",
                    data.len()
                ),
            });
        }
        let data = data
            .into_iter()
            .map(|v| {
                if v < 0.1 {
                    0.0
                } else if v > 0.9 {
                    1.0
                } else {
                    0.5
                }
            })
            .collect();
        Ok(Self {
            data,
            height,
            width,
        })
    }

    /// Build directly from already-quantized values, without snapping.
    /// Used internally by [`crate::trimap::TrimapBuilder`], which only
    /// ever emits `{0, 0.5, 1}`.
    pub(crate) fn from_quantized(data: Vec<f64>, height: usize, width: usize) -> Self {
        debug_assert_eq!(data.len(), height * width);
        debug_assert!(data
            .iter()
            .all(|&v| v == 0.0 || v == 0.5 || v == 1.0));
        Self {
            data,
            height,
            width,
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn get(&self, y: usize, x: usize) -> f64 {
        self.data[y * self.width + x]
    }

    /// `true` iff the pixel is definite foreground or background.
    #[inline]
    pub fn is_known(&self, idx: usize) -> bool {
        let v = self.data[idx];
        !(0.1..=0.9).contains(&v)
    }

    /// `true` iff every pixel is known (no `0.5` unknowns remain).
    pub fn is_fully_known(&self) -> bool {
        self.data.iter().all(|&v| v != 0.5)
    }

    /// Count of pixels at the unknown (`0.5`) level.
    pub fn unknown_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == 0.5).count()
    }
}

/// The solved opacity map, one value per pixel in `[0,1]`.
#[derive(Debug, Clone)]
pub struct Alpha {
    data: Vec<f64>,
    height: usize,
    width: usize,
}

impl Alpha {
    pub(crate) fn new(data: Vec<f64>, height: usize, width: usize) -> Self {
        debug_assert_eq!(data.len(), height * width);
        Self {
            data,
            height,
            width,
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

/// The unmixed foreground color layer, `height*width*3` samples in `[0,1]`.
#[derive(Debug, Clone)]
pub struct Foreground {
    data: Vec<f64>,
    height: usize,
    width: usize,
}

impl Foreground {
    pub(crate) fn new(data: Vec<f64>, height: usize, width: usize) -> Self {
        debug_assert_eq!(data.len(), height * width * 3);
        Self {
            data,
            height,
            width,
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

/// Encode an RGB foreground layer and an alpha map into an interleaved
/// 8-bit RGBA buffer, clamped to `[0,255]`.
pub fn encode_rgba8(foreground: &Foreground, alpha: &Alpha) -> Vec<u8> {
    let n = foreground.height * foreground.width;
    let mut out = Vec::with_capacity(n * 4);
    let fg = foreground.as_slice();
    let a = alpha.as_slice();
    for i in 0..n {
        let base = i * 3;
        out.push(to_u8(fg[base]));
        out.push(to_u8(fg[base + 1]));
        out.push(to_u8(fg[base + 2]));
        out.push(to_u8(a[i]));
    }
    out
}

#[inline]
fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
