//! Reduced-system extraction.
//!
//! `spec.md` §4.D names the reduced form as the required target: rather
//! than solving the full `N x N` system with a confidence term pinning
//! known pixels, extract the submatrix `L_UU` over only the unknown
//! pixels and fold the known pixels' contribution into the right-hand
//! side via `L_UK`. Since confidence is exactly zero at unknown pixels
//! by construction (`spec.md` §4.D: `confidence[i] = kappa if
//! consts_map[i] else 0`), the `diag(kappa)_U` and `(kappa*T)_U` terms
//! in the spec's formula are identically zero and drop out, leaving
//! `L_UU * x_U = -L_UK * T_K`.

use nalgebra_sparse::{CooMatrix, CscMatrix};

/// The reduced `L_UU` system matrix and right-hand side `-L_UK * T_K`,
/// plus the bookkeeping needed to scatter the solved `x_U` back into a
/// full-length alpha vector alongside the known pixels' trimap values.
pub(super) struct ReducedSystem {
    pub matrix: CscMatrix<f64>,
    pub rhs: Vec<f64>,
    /// Original raster index of each compact unknown row/column.
    pub unknown_indices: Vec<usize>,
}

/// Build the reduced system from the full Laplacian, the known/unknown
/// partition, and the trimap values at known pixels.
///
/// `known[i]` marks pixel `i` as a known (fg/bg) pixel; every other
/// pixel is unknown and gets a compact row/column in the returned
/// matrix, in ascending original-index order.
pub(super) fn build_reduced_system(
    laplacian: &CscMatrix<f64>,
    known: &[bool],
    trimap_values: &[f64],
) -> ReducedSystem {
    let n = known.len();
    let mut compact = vec![usize::MAX; n];
    let mut unknown_indices = Vec::new();
    for i in 0..n {
        if !known[i] {
            compact[i] = unknown_indices.len();
            unknown_indices.push(i);
        }
    }
    let m = unknown_indices.len();

    let mut coo = CooMatrix::new(m.max(1), m.max(1));
    let mut rhs = vec![0.0; m];
    for (r, c, &v) in laplacian.triplet_iter() {
        let r_unknown = !known[r];
        let c_unknown = !known[c];
        match (r_unknown, c_unknown) {
            (true, true) => coo.push(compact[r], compact[c], v),
            (true, false) => rhs[compact[r]] -= v * trimap_values[c],
            _ => {}
        }
    }

    ReducedSystem {
        matrix: CscMatrix::from(&coo),
        rhs,
        unknown_indices,
    }
}
