//! Request/response types and runtime parameters for [`super::MattingPipeline`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foreground::DEFAULT_LAMBDA;
use crate::laplacian::{DEFAULT_EPS, DEFAULT_WIN_RAD};
use crate::solver::DEFAULT_CONFIDENCE;
use crate::trimap::{
    DEFAULT_BACKGROUND_THRESHOLD, DEFAULT_BAND_RATIO, DEFAULT_ERODE_STRUCTURE_SIZE,
    DEFAULT_FOREGROUND_THRESHOLD, DEFAULT_MID_BAND,
};
use crate::types::{Image, Mask, Trimap};

fn default_foreground_threshold() -> u8 {
    DEFAULT_FOREGROUND_THRESHOLD
}
fn default_background_threshold() -> u8 {
    DEFAULT_BACKGROUND_THRESHOLD
}
fn default_erode_structure_size() -> usize {
    DEFAULT_ERODE_STRUCTURE_SIZE
}
fn default_band_ratio() -> f64 {
    DEFAULT_BAND_RATIO
}
fn default_mid_band() -> f64 {
    DEFAULT_MID_BAND
}
fn default_eps() -> f64 {
    DEFAULT_EPS
}
fn default_win_rad() -> usize {
    DEFAULT_WIN_RAD
}
fn default_trimap_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}
fn default_lambda() -> f64 {
    DEFAULT_LAMBDA
}
fn default_use_entropy() -> bool {
    false
}

/// Tunable knobs for the whole pipeline, mirroring the CLI/host's
/// configuration layer: every field has a named default function so a
/// partially-specified config (e.g. from a TOML/JSON file with only a
/// couple of overrides) deserializes without error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub foreground_threshold: u8,
    pub background_threshold: u8,
    pub erode_structure_size: usize,
    pub band_ratio: f64,
    pub mid_band: f64,
    pub eps: f64,
    pub win_rad: usize,
    pub trimap_confidence: f64,
    pub lambda: f64,
    pub use_entropy: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            foreground_threshold: default_foreground_threshold(),
            background_threshold: default_background_threshold(),
            erode_structure_size: default_erode_structure_size(),
            band_ratio: default_band_ratio(),
            mid_band: default_mid_band(),
            eps: default_eps(),
            win_rad: default_win_rad(),
            trimap_confidence: default_trimap_confidence(),
            lambda: default_lambda(),
            use_entropy: default_use_entropy(),
        }
    }
}

/// Cooperative cancellation handle. Cheap to clone; every clone shares
/// the same underlying flag, so a caller can hold one end and pass the
/// other into [`super::MattingPipeline::run`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// The already-known region, supplied either as a soft mask (which the
/// pipeline turns into a trimap itself, per `use_entropy`) or as an
/// already-built trimap (skipping trimap construction entirely).
#[derive(Debug, Clone)]
pub enum TrimapInput {
    Mask(Mask),
    Trimap(Trimap),
}

/// One image and its prior, to be processed by a [`super::MattingPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub image: Image,
    pub prior: TrimapInput,
    pub cancel: Option<CancelToken>,
}

impl PipelineRequest {
    pub fn new(image: Image, prior: TrimapInput) -> Self {
        Self {
            image,
            prior,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Whether the solve completed normally or was forced to degrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Converged,
    /// The solver fell back to the clamped prior trimap for at least one
    /// image (`spec.md` §7): the result is usable but not a true solve.
    Degraded,
}

/// Result of running the pipeline on one [`PipelineRequest`].
#[derive(Debug, Clone)]
pub struct PipelineResponse {
    pub alpha: crate::types::Alpha,
    pub foreground: crate::types::Foreground,
    pub status: PipelineStatus,
    pub unknown_pixels: usize,
}
