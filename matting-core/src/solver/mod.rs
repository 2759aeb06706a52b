//! Constrained alpha solve.
//!
//! [`MattingSolver`] takes the matting Laplacian and a trimap and solves
//! for alpha over the unknown region, with known pixels held fixed as
//! boundary conditions. See `spec.md` §4.D.

mod cg;
mod reduce;

use nalgebra::DVector;
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::CscMatrix;

use crate::api::MattingError;
use crate::types::{Alpha, Trimap};

/// Residual convergence threshold for the conjugate-gradient fallback:
/// `||A x - b|| / ||b|| <= CG_TOLERANCE`.
pub const CG_TOLERANCE: f64 = 1e-6;

/// Maximum conjugate-gradient iterations before giving up and reporting
/// [`MattingError::SolverFallback`].
pub const CG_MAX_ITERS: usize = 2_000;

/// Default trust placed in the known trimap pixels: how strongly the
/// quadratic form pins `alpha` at `0`/`1` away from `L`'s own preference.
pub const DEFAULT_CONFIDENCE: f64 = 100.0;

/// Solves the reduced system `L_UU alpha_U = -L_UK trimap_K` for alpha
/// over the unknown pixels, pinning known pixels to their trimap value.
#[derive(Debug, Clone, Copy)]
pub struct MattingSolver {
    confidence: f64,
}

impl MattingSolver {
    pub fn new(confidence: f64) -> Result<Self, MattingError> {
        if !(confidence > 0.0) {
            return Err(MattingError::InvalidParameter {
                name: "trimap_confidence",
                detail: format!("must be positive, got {confidence}"),
            });
        }
        Ok(Self { confidence })
    }

    #[inline]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Solve for alpha. If every pixel is already known, returns the
    /// trimap verbatim without touching the Laplacian at all
    /// (`spec.md` §4.D edge case / §8 "all-known" property).
    #[tracing::instrument(level = "debug", skip(self, laplacian, trimap))]
    pub fn solve(
        &self,
        laplacian: &CscMatrix<f64>,
        trimap: &Trimap,
    ) -> Result<Alpha, MattingError> {
        let height = trimap.height();
        let width = trimap.width();
        let n = height * width;
        if laplacian.nrows() != n || laplacian.ncols() != n {
            return Err(MattingError::InvalidDimensions {
                detail: format!(
                    "laplacian is {}x{}, expected {n}x{n}",
                    laplacian.nrows(),
                    laplacian.ncols()
                ),
            });
        }

        if trimap.is_fully_known() {
            tracing::debug!("trimap fully known, skipping solve");
            return Ok(Alpha::new(trimap.as_slice().to_vec(), height, width));
        }

        let known: Vec<bool> = (0..n).map(|i| trimap.is_known(i)).collect();
        let values: Vec<f64> = trimap.as_slice().to_vec();

        // Reduced-system form (spec.md §4.D, required behavior): solve
        // only over the unknown submatrix, with known pixels folded into
        // the right-hand side rather than pinned via a confidence term.
        let reduced = reduce::build_reduced_system(laplacian, &known, &values);
        let b_vec = DVector::from_vec(reduced.rhs.clone());
        let x_u: Vec<f64> = match CscCholesky::factor(&reduced.matrix) {
            Ok(chol) => chol.solve(&b_vec).as_slice().to_vec(),
            Err(_) => {
                tracing::debug!("Cholesky factorization failed, falling back to conjugate gradient");
                match cg::solve_jacobi_pcg(&reduced.matrix, &reduced.rhs, CG_TOLERANCE, CG_MAX_ITERS) {
                    Some(x) => x,
                    None => {
                        return Err(MattingError::SolverFallback {
                            alpha: values.iter().map(|v| v.clamp(0.0, 1.0)).collect(),
                        })
                    }
                }
            }
        };

        // Reconstruct the full solution: x_K = T_K verbatim, x_U as solved.
        let mut alpha = values.clone();
        for (compact_idx, &orig_idx) in reduced.unknown_indices.iter().enumerate() {
            alpha[orig_idx] = x_u[compact_idx];
        }

        let clamped: Vec<f64> = alpha.iter().map(|v| v.clamp(0.0, 1.0)).collect();
        Ok(Alpha::new(clamped, height, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::laplacian::LaplacianBuilder;
    use crate::types::{Image, Trimap};

    fn flat_image(h: usize, w: usize) -> Image {
        let mut data = vec![0.0; h * w * 3];
        for i in 0..h * w {
            data[i * 3] = (i as f64 / (h * w) as f64).fract();
            data[i * 3 + 1] = 0.5;
            data[i * 3 + 2] = 0.2;
        }
        Image::from_vec(data, h, w).unwrap()
    }

    #[test]
    fn rejects_non_positive_confidence() {
        assert!(MattingSolver::new(0.0).is_err());
    }

    #[test]
    fn fully_known_trimap_passes_through_unchanged() {
        let h = 4;
        let w = 4;
        let image = flat_image(h, w);
        let mut raw = vec![0.0; h * w];
        for (i, v) in raw.iter_mut().enumerate() {
            *v = if i % 2 == 0 { 1.0 } else { 0.0 };
        }
        let trimap = Trimap::from_raw(raw.clone(), h, w).unwrap();
        let laplacian = LaplacianBuilder::new(1e-7, 1).unwrap().build(&image, None).unwrap();
        let solver = MattingSolver::new(100.0).unwrap();
        let alpha = solver.solve(&laplacian, &trimap).unwrap();
        assert_eq!(alpha.as_slice(), raw.as_slice());
    }

    #[test]
    fn known_pixels_stay_clamped_near_their_trimap_value() {
        let h = 8;
        let w = 8;
        let image = flat_image(h, w);
        let mut raw = vec![0.5; h * w];
        for y in 0..h {
            for x in 0..w {
                if x < 2 {
                    raw[y * w + x] = 0.0;
                } else if x >= w - 2 {
                    raw[y * w + x] = 1.0;
                }
            }
        }
        let trimap = Trimap::from_raw(raw, h, w).unwrap();
        let laplacian = LaplacianBuilder::new(1e-7, 1).unwrap().build(&image, None).unwrap();
        let solver = MattingSolver::new(100.0).unwrap();
        let alpha = solver.solve(&laplacian, &trimap).unwrap();

        for y in 0..h {
            assert!(alpha.as_slice()[y * w] < 0.15, "known background should stay near 0");
            assert!(alpha.as_slice()[y * w + w - 1] > 0.85, "known foreground should stay near 1");
        }
        assert!(alpha.as_slice().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn rejects_laplacian_with_mismatched_dimensions() {
        let h = 4;
        let w = 4;
        let image = flat_image(h, w);
        let trimap = Trimap::from_raw(vec![0.5; h * w], h, w).unwrap();
        let laplacian = LaplacianBuilder::new(1e-7, 1)
            .unwrap()
            .build(&image, None)
            .unwrap();
        let wrong_trimap = Trimap::from_raw(vec![0.5; 9], 3, 3).unwrap();
        let solver = MattingSolver::new(100.0).unwrap();
        assert!(solver.solve(&laplacian, &wrong_trimap).is_err());
    }
}
