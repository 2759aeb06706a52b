//! Sliding-window index generation.
//!
//! This module provides [`RollingWindow`], which maps each interior pixel
//! of an `H x W` raster to the flat indices of its `(2r+1) x (2r+1)`
//! neighborhood. Everything downstream (the matting Laplacian assembly,
//! trimap refinement mask dilation) consumes these index lists rather
//! than re-deriving offsets, so the row/column scan order used when
//! scattering values into the sparse Laplacian is guaranteed to agree
//! between row and column index generation.

use std::ops::Deref;

use crate::api::MattingError;

/// Flat window indices, either the stack-allocated `radius == 1` fast
/// path or a heap-allocated fallback for larger radii.
pub enum WindowIndices {
    Fixed3x3([usize; 9]),
    Heap(Vec<usize>),
}

impl Deref for WindowIndices {
    type Target = [usize];

    #[inline]
    fn deref(&self) -> &[usize] {
        match self {
            WindowIndices::Fixed3x3(arr) => arr.as_slice(),
            WindowIndices::Heap(v) => v.as_slice(),
        }
    }
}

/// Precomputed window indices for a `height x width` raster.
///
/// `windows()` yields, for every interior pixel in row-major order, the
/// flat raveled indices (`y * width + x`) of the `(2r+1)^2` pixels in its
/// window, scanned row-major from the window's top-left corner.
pub struct RollingWindow {
    height: usize,
    width: usize,
    radius: usize,
    interior_height: usize,
    interior_width: usize,
}

impl RollingWindow {
    /// Construct a rolling window over a `height x width` raster.
    ///
    /// Returns [`MattingError::InvalidDimensions`] if either dimension is
    /// smaller than the window diameter `2*radius + 1`.
    pub fn new(height: usize, width: usize, radius: usize) -> Result<Self, MattingError> {
        let diam = 2 * radius + 1;
        if height < diam || width < diam {
            return Err(MattingError::InvalidDimensions {
                detail: format!(
                    "raster {height}x{width} is smaller than the window diameter {diam} (radius {radius})"
                ),
            });
        }
        Ok(Self {
            height,
            width,
            radius,
            interior_height: height - 2 * radius,
            interior_width: width - 2 * radius,
        })
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Side length of the square window, `2*radius + 1`.
    #[inline]
    pub fn diameter(&self) -> usize {
        2 * self.radius + 1
    }

    /// Number of pixels per window, `(2*radius + 1)^2`.
    #[inline]
    pub fn window_size(&self) -> usize {
        self.diameter() * self.diameter()
    }

    /// Height of the interior region (`height - 2*radius`) whose pixels
    /// each center a full window.
    #[inline]
    pub fn interior_height(&self) -> usize {
        self.interior_height
    }

    /// Width of the interior region (`width - 2*radius`).
    #[inline]
    pub fn interior_width(&self) -> usize {
        self.interior_width
    }

    /// Flat indices of the window centered at interior coordinates
    /// `(cy, cx)`, where `cy in 0..interior_height`, `cx in 0..interior_width`
    /// address the window whose top-left corner is `(cy, cx)` in the full
    /// raster (i.e. centered at raster pixel `(cy + radius, cx + radius)`).
    ///
    /// Scan order is row-major from the window's top-left corner.
    pub fn indices_for(&self, cy: usize, cx: usize) -> Vec<usize> {
        let diam = self.diameter();
        let mut out = Vec::with_capacity(diam * diam);
        for dy in 0..diam {
            let row_base = (cy + dy) * self.width;
            for dx in 0..diam {
                out.push(row_base + cx + dx);
            }
        }
        out
    }

    /// Fast path for the default `radius == 1` (3x3) window, avoiding a
    /// heap allocation per window.
    pub fn indices3x3(&self, cy: usize, cx: usize) -> [usize; 9] {
        debug_assert_eq!(self.radius, 1);
        let w = self.width;
        let top = cy * w;
        let mid = (cy + 1) * w;
        let bot = (cy + 2) * w;
        [
            top + cx,
            top + cx + 1,
            top + cx + 2,
            mid + cx,
            mid + cx + 1,
            mid + cx + 2,
            bot + cx,
            bot + cx + 1,
            bot + cx + 2,
        ]
    }

    /// Flat indices of the window centered at interior coordinates
    /// `(cy, cx)`, dispatching to the allocation-free [`Self::indices3x3`]
    /// fast path when `radius == 1` and falling back to
    /// [`Self::indices_for`] otherwise.
    #[inline]
    pub fn indices(&self, cy: usize, cx: usize) -> WindowIndices {
        if self.radius == 1 {
            WindowIndices::Fixed3x3(self.indices3x3(cy, cx))
        } else {
            WindowIndices::Heap(self.indices_for(cy, cx))
        }
    }

    /// Iterate over every interior window's top-left `(cy, cx)` in
    /// row-major order.
    pub fn iter_positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.interior_height)
            .flat_map(move |cy| (0..self.interior_width).map(move |cx| (cy, cx)))
    }
}
