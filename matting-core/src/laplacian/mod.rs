//! Matting Laplacian assembly.
//!
//! [`LaplacianBuilder`] turns an image (plus an optional boolean
//! refinement mask) into the sparse matting Laplacian `L`: the Levin et
//! al. closed-form matting kernel. See `spec.md` §4.B for the derivation;
//! this module follows it window by window, accumulating contributions
//! in chunks to bound peak memory, per `spec.md`'s memory policy.

mod window_stats;

use nalgebra_sparse::{CooMatrix, CscMatrix};
use rayon::prelude::*;

use crate::api::MattingError;
use crate::morph::dilate_square;
use crate::types::Image;
use crate::window::RollingWindow;

use window_stats::window_contribution;

/// Number of windows processed per chunk before their triplets are
/// appended to the running total. Bounds peak working memory to
/// `O(chunk * window_size^2)` rather than `O(H*W*window_size^2)`.
pub const WINDOW_CHUNK_SIZE: usize = 10_000;

/// Default Laplacian regularizer `eps` (`spec.md` §4.B).
pub const DEFAULT_EPS: f64 = 1e-7;

/// Default window radius (`spec.md` §4.B): 3x3 windows.
pub const DEFAULT_WIN_RAD: usize = 1;

/// Assembles the sparse matting Laplacian for an image.
#[derive(Debug, Clone, Copy)]
pub struct LaplacianBuilder {
    eps: f64,
    win_rad: usize,
}

impl LaplacianBuilder {
    /// Construct a builder with the given regularizer and window radius.
    pub fn new(eps: f64, win_rad: usize) -> Result<Self, MattingError> {
        if !(eps > 0.0) {
            return Err(MattingError::InvalidParameter {
                name: "eps",
                detail: format!("must be positive, got {eps}"),
            });
        }
        if win_rad == 0 {
            return Err(MattingError::InvalidParameter {
                name: "win_rad",
                detail: "must be >= 1".to_string(),
            });
        }
        Ok(Self { eps, win_rad })
    }

    #[inline]
    pub fn eps(&self) -> f64 {
        self.eps
    }

    #[inline]
    pub fn win_rad(&self) -> usize {
        self.win_rad
    }

    /// Assemble `L` for `image`, optionally restricted to windows that
    /// touch `refine_mask` (dilated by the window's own diameter first).
    ///
    /// Passing `None` builds the full, unrestricted Laplacian. Passing
    /// `Some(mask)` with `mask[i] == true` marking "unknown" pixels is
    /// the optimization `spec.md` §4.D relies on: only windows touching
    /// the unknown region contribute, which is what makes the solve
    /// tractable on large images.
    #[tracing::instrument(level = "debug", skip(self, image, refine_mask))]
    pub fn build(
        &self,
        image: &Image,
        refine_mask: Option<&[bool]>,
    ) -> Result<CscMatrix<f64>, MattingError> {
        let height = image.height();
        let width = image.width();
        let rw = RollingWindow::new(height, width, self.win_rad)?;
        let diam = rw.diameter();

        if let Some(mask) = refine_mask {
            if mask.len() != height * width {
                return Err(MattingError::InvalidDimensions {
                    detail: format!(
                        "refine mask length {} does not match height*width = {}",
                        mask.len(),
                        height * width
                    ),
                });
            }
        }

        let dilated_mask = refine_mask.map(|m| dilate_square(m, height, width, diam));

        let positions: Vec<(usize, usize)> = rw
            .iter_positions()
            .filter(|&(cy, cx)| match &dilated_mask {
                None => true,
                Some(dm) => rw.indices(cy, cx).iter().any(|&idx| dm[idx]),
            })
            .collect();

        tracing::debug!(
            total_windows = rw.interior_height() * rw.interior_width(),
            kept_windows = positions.len(),
            "assembling matting Laplacian"
        );

        let n = height * width;
        let chunks: Vec<(Vec<usize>, Vec<usize>, Vec<f64>)> = positions
            .par_chunks(WINDOW_CHUNK_SIZE)
            .map(|chunk| {
                let mut rows = Vec::new();
                let mut cols = Vec::new();
                let mut vals = Vec::new();
                for &(cy, cx) in chunk {
                    let idxs = rw.indices(cy, cx);
                    let iw: Vec<[f64; 3]> = idxs.iter().map(|&i| image.pixel_at(i)).collect();
                    let v = window_contribution(&iw, self.eps);
                    let wn = idxs.len();
                    for i in 0..wn {
                        for j in 0..wn {
                            rows.push(idxs[i]);
                            cols.push(idxs[j]);
                            vals.push(v[i * wn + j]);
                        }
                    }
                }
                (rows, cols, vals)
            })
            .collect();

        let mut coo = CooMatrix::new(n, n);
        for (rows, cols, vals) in chunks {
            for i in 0..rows.len() {
                coo.push(rows[i], cols[i], vals[i]);
            }
        }

        Ok(CscMatrix::from(&coo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_gray_image(h: usize, w: usize, v: f64) -> Image {
        Image::from_vec(vec![v; h * w * 3], h, w).unwrap()
    }

    #[test]
    fn rejects_non_positive_eps() {
        assert!(LaplacianBuilder::new(0.0, 1).is_err());
        assert!(LaplacianBuilder::new(-1.0, 1).is_err());
    }

    #[test]
    fn rejects_zero_radius() {
        assert!(LaplacianBuilder::new(1e-7, 0).is_err());
    }

    #[test]
    fn row_sums_are_zero() {
        // A flat-color image: every window contribution still has zero
        // row sums, since it's the defining property of the kernel
        // (constant alpha is in the null space) regardless of content.
        let image = flat_gray_image(6, 6, 0.5);
        let builder = LaplacianBuilder::new(1e-7, 1).unwrap();
        let l = builder.build(&image, None).unwrap();
        let n = l.nrows();
        let mut row_sums = vec![0.0; n];
        for (r, c, v) in l.triplet_iter() {
            let _ = c;
            row_sums[r] += v;
        }
        for (i, sum) in row_sums.iter().enumerate() {
            assert!(sum.abs() < 1e-8, "row {i} sum {sum} not ~0");
        }
    }

    #[test]
    fn matrix_is_symmetric() {
        let image = flat_gray_image(6, 6, 0.3);
        let builder = LaplacianBuilder::new(1e-7, 1).unwrap();
        let l = builder.build(&image, None).unwrap();
        let dense_n = l.nrows();
        let mut dense = vec![0.0; dense_n * dense_n];
        for (r, c, v) in l.triplet_iter() {
            dense[r * dense_n + c] += v;
        }
        for r in 0..dense_n {
            for c in 0..dense_n {
                let diff = (dense[r * dense_n + c] - dense[c * dense_n + r]).abs();
                assert!(diff < 1e-10, "L[{r},{c}] != L[{c},{r}] (diff {diff})");
            }
        }
    }

    #[test]
    fn refinement_mask_drops_untouched_windows() {
        let image = flat_gray_image(8, 8, 0.4);
        let builder = LaplacianBuilder::new(1e-7, 1).unwrap();
        let full = builder.build(&image, None).unwrap();

        let mut mask = vec![false; 64];
        mask[3 * 8 + 3] = true; // a single unknown pixel near the center
        let restricted = builder.build(&image, Some(&mask)).unwrap();

        assert!(restricted.nnz() <= full.nnz());
        assert!(restricted.nnz() > 0);
    }

    #[test]
    fn rejects_mask_with_wrong_length() {
        let image = flat_gray_image(4, 4, 0.2);
        let builder = LaplacianBuilder::new(1e-7, 1).unwrap();
        let bad_mask = vec![true; 5];
        assert!(builder.build(&image, Some(&bad_mask)).is_err());
    }
}
