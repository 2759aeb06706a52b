//! Foreground color-layer estimation.
//!
//! [`ForegroundSolver`] unmixes `image = alpha*F + (1-alpha)*B` for `F`
//! using the multilevel approach from `spec.md` §4.E: solve at a coarse
//! pyramid level first, then refine level by level, each level only
//! running a handful of local normal-equation updates seeded from the
//! coarser estimate.

mod pyramid;

use rayon::prelude::*;

use crate::api::MattingError;
use crate::types::{Alpha, Foreground, Image};

/// Regularization weight on the foreground/background gradient penalty
/// (`spec.md` §4.E).
pub const DEFAULT_LAMBDA: f64 = 1e-5;

/// Maximum local normal-equation update iterations run per pyramid level.
pub const MAX_LOCAL_ITERS: usize = 10;

/// Estimates the foreground color layer given an image and its alpha.
#[derive(Debug, Clone, Copy)]
pub struct ForegroundSolver {
    lambda: f64,
}

impl ForegroundSolver {
    pub fn new(lambda: f64) -> Result<Self, MattingError> {
        if !(lambda > 0.0) {
            return Err(MattingError::InvalidParameter {
                name: "lambda",
                detail: format!("must be positive, got {lambda}"),
            });
        }
        Ok(Self { lambda })
    }

    #[inline]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Estimate the foreground layer for `image` under `alpha`.
    #[tracing::instrument(level = "debug", skip(self, image, alpha))]
    pub fn solve(&self, image: &Image, alpha: &Alpha) -> Result<Foreground, MattingError> {
        let height = image.height();
        let width = image.width();
        if alpha.height() != height || alpha.width() != width {
            return Err(MattingError::InvalidDimensions {
                detail: format!(
                    "alpha is {}x{}, image is {height}x{width}",
                    alpha.height(),
                    alpha.width()
                ),
            });
        }

        let levels = pyramid::build_levels(image, alpha);
        tracing::debug!(level_count = levels.len(), "foreground pyramid built");

        // Coarsest level: a flat initial guess equal to the image itself
        // (background contribution is negligible once alpha extremes
        // dominate a 1x1-ish image).
        let coarsest = levels.last().expect("pyramid always has >=1 level");
        let mut fg = coarsest.image.clone();
        let mut bg = coarsest.image.clone();

        for idx in (0..levels.len()).rev() {
            let level = &levels[idx];
            pyramid::refine_level(level, &mut fg, &mut bg, self.lambda, MAX_LOCAL_ITERS);
            if idx > 0 {
                let next = &levels[idx - 1];
                fg = pyramid::upsample(&fg, level.height, level.width, next.height, next.width);
                bg = pyramid::upsample(&bg, level.height, level.width, next.height, next.width);
            }
        }

        // Final per-pixel composite-consistency correction in parallel:
        // clamp each solved foreground pixel into range and leave
        // background out of the surfaced result (`spec.md` §3 only
        // requires the foreground layer).
        let clamped: Vec<f64> = fg.par_iter().map(|v| v.clamp(0.0, 1.0)).collect();

        Ok(Foreground::new(clamped, height, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Alpha;

    fn solid_color_image(h: usize, w: usize, rgb: [f64; 3]) -> Image {
        let mut data = vec![0.0; h * w * 3];
        for px in data.chunks_exact_mut(3) {
            px.copy_from_slice(&rgb);
        }
        Image::from_vec(data, h, w).unwrap()
    }

    #[test]
    fn rejects_non_positive_lambda() {
        assert!(ForegroundSolver::new(0.0).is_err());
    }

    #[test]
    fn fully_opaque_flat_image_recovers_its_own_color() {
        let h = 8;
        let w = 8;
        let image = solid_color_image(h, w, [0.8, 0.3, 0.1]);
        let alpha = Alpha::new(vec![1.0; h * w], h, w);
        let fg = ForegroundSolver::new(1e-5).unwrap().solve(&image, &alpha).unwrap();
        for px in fg.as_slice().chunks_exact(3) {
            assert!((px[0] - 0.8).abs() < 0.05);
            assert!((px[1] - 0.3).abs() < 0.05);
            assert!((px[2] - 0.1).abs() < 0.05);
        }
    }

    #[test]
    fn rejects_mismatched_alpha_dimensions() {
        let image = solid_color_image(4, 4, [0.5, 0.5, 0.5]);
        let alpha = Alpha::new(vec![1.0; 9], 3, 3);
        assert!(ForegroundSolver::new(1e-5).unwrap().solve(&image, &alpha).is_err());
    }

    #[test]
    fn output_stays_within_unit_range() {
        let h = 16;
        let w = 16;
        let mut data = vec![0.0; h * w * 3];
        for (i, px) in data.chunks_exact_mut(3).enumerate() {
            let t = (i % w) as f64 / w as f64;
            px.copy_from_slice(&[t, 1.0 - t, 0.5]);
        }
        let image = Image::from_vec(data, h, w).unwrap();
        let mut alpha_data = vec![0.0; h * w];
        for y in 0..h {
            for x in 0..w {
                alpha_data[y * w + x] = if x < w / 2 { 1.0 } else { 0.0 };
            }
        }
        let alpha = Alpha::new(alpha_data, h, w);
        let fg = ForegroundSolver::new(1e-5).unwrap().solve(&image, &alpha).unwrap();
        assert!(fg.as_slice().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
