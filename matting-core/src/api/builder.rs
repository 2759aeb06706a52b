//! Public builder API.

use std::sync::Arc;

use super::error::MattingError;
use super::request::{Parameters, PipelineRequest, PipelineResponse};
use crate::cache::LaplacianCache;
use crate::pipeline::Pipeline;

/// Configures and runs the closed-form matting pipeline.
///
/// Construction never fails: [`MattingPipeline::new`] starts from the
/// documented defaults, and every configuration method either takes an
/// always-valid value or returns a `Result` so an invalid override is
/// caught at the call site rather than surfacing later as a confusing
/// mid-solve error. [`MattingPipeline::run`] takes `&self`, so one
/// configured instance can process many images; its internal Laplacian
/// cache is shared and reused across calls.
///
/// ```no_run
/// use matting_core::{MattingPipeline, PipelineRequest, TrimapInput, Image, Mask};
///
/// # fn example(image: Image, mask: Mask) -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = MattingPipeline::new().use_entropy(false);
/// let request = PipelineRequest::new(image, TrimapInput::Mask(mask));
/// let response = pipeline.run(&request)?;
/// println!("unknown pixels: {}", response.unknown_pixels);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MattingPipeline {
    params: Parameters,
    cache: Arc<LaplacianCache>,
}

impl MattingPipeline {
    pub fn new() -> Self {
        Self {
            params: Parameters::default(),
            cache: Arc::new(LaplacianCache::new()),
        }
    }

    /// Replace the whole parameter set at once, e.g. one deserialized
    /// from a config file.
    pub fn with_parameters(mut self, params: Parameters) -> Self {
        self.params = params;
        self
    }

    pub fn foreground_threshold(mut self, threshold: u8) -> Result<Self, MattingError> {
        if threshold <= self.params.background_threshold {
            return Err(MattingError::InvalidParameter {
                name: "foreground_threshold",
                detail: "must be greater than background_threshold".to_string(),
            });
        }
        self.params.foreground_threshold = threshold;
        Ok(self)
    }

    pub fn background_threshold(mut self, threshold: u8) -> Result<Self, MattingError> {
        if threshold >= self.params.foreground_threshold {
            return Err(MattingError::InvalidParameter {
                name: "background_threshold",
                detail: "must be less than foreground_threshold".to_string(),
            });
        }
        self.params.background_threshold = threshold;
        Ok(self)
    }

    pub fn erode_structure_size(mut self, size: usize) -> Self {
        self.params.erode_structure_size = size;
        self
    }

    pub fn band_ratio(mut self, ratio: f64) -> Result<Self, MattingError> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(MattingError::InvalidParameter {
                name: "band_ratio",
                detail: format!("must be in (0, 1], got {ratio}"),
            });
        }
        self.params.band_ratio = ratio;
        Ok(self)
    }

    pub fn mid_band(mut self, half_width: f64) -> Result<Self, MattingError> {
        if !(0.0..0.5).contains(&half_width) {
            return Err(MattingError::InvalidParameter {
                name: "mid_band",
                detail: format!("must be in [0, 0.5), got {half_width}"),
            });
        }
        self.params.mid_band = half_width;
        Ok(self)
    }

    pub fn eps(mut self, eps: f64) -> Result<Self, MattingError> {
        if !(eps > 0.0) {
            return Err(MattingError::InvalidParameter {
                name: "eps",
                detail: format!("must be positive, got {eps}"),
            });
        }
        self.params.eps = eps;
        Ok(self)
    }

    pub fn win_rad(mut self, win_rad: usize) -> Result<Self, MattingError> {
        if win_rad == 0 {
            return Err(MattingError::InvalidParameter {
                name: "win_rad",
                detail: "must be >= 1".to_string(),
            });
        }
        self.params.win_rad = win_rad;
        Ok(self)
    }

    pub fn trimap_confidence(mut self, confidence: f64) -> Result<Self, MattingError> {
        if !(confidence > 0.0) {
            return Err(MattingError::InvalidParameter {
                name: "trimap_confidence",
                detail: format!("must be positive, got {confidence}"),
            });
        }
        self.params.trimap_confidence = confidence;
        Ok(self)
    }

    pub fn lambda(mut self, lambda: f64) -> Result<Self, MattingError> {
        if !(lambda > 0.0) {
            return Err(MattingError::InvalidParameter {
                name: "lambda",
                detail: format!("must be positive, got {lambda}"),
            });
        }
        self.params.lambda = lambda;
        Ok(self)
    }

    pub fn use_entropy(mut self, use_entropy: bool) -> Self {
        self.params.use_entropy = use_entropy;
        self
    }

    /// Number of Laplacians currently resident in the internal cache.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Run the pipeline on one request, ignoring progress notifications.
    pub fn run(&self, request: &PipelineRequest) -> Result<PipelineResponse, MattingError> {
        self.run_with_progress(request, |_| {})
    }

    /// Run the pipeline on one request, invoking `on_progress` with a
    /// percent-complete value at each stage boundary (`spec.md` §4.F:
    /// `5, 10, 30, 70, 90, 100`).
    pub fn run_with_progress(
        &self,
        request: &PipelineRequest,
        on_progress: impl FnMut(u8),
    ) -> Result<PipelineResponse, MattingError> {
        let engine = Pipeline::new(self.params.clone(), Arc::clone(&self.cache));
        engine.run(request, on_progress)
    }
}

impl Default for MattingPipeline {
    fn default() -> Self {
        Self::new()
    }
}
