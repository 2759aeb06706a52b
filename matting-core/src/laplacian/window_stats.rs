//! Per-window covariance statistics and contribution matrix.
//!
//! Split out from `mod.rs` so the chunk-assembly loop (indices, scatter-
//! add bookkeeping) stays separate from the per-window linear algebra.

use nalgebra::{Matrix3, Vector3};

/// Compute the `n x n` (row-major, flattened) contribution matrix `V`
/// for one window of `n` pixel colors, per `spec.md` §4.B steps 2-5:
///
/// 1. `mu`, `Sigma` = window mean and covariance.
/// 2. `A = Sigma + (eps/n) * I3`.
/// 3. Solve `A * X = (Iw - mu)^T` for `X` (falling back to the
///    Moore-Penrose pseudo-inverse if `A` is singular).
/// 4. `V = I_n - (1/n) * (1 + (Iw - mu) * X)`.
pub(super) fn window_contribution(iw: &[[f64; 3]], eps: f64) -> Vec<f64> {
    let n = iw.len();
    let nf = n as f64;

    let mut mu = Vector3::zeros();
    for p in iw {
        mu += Vector3::new(p[0], p[1], p[2]);
    }
    mu /= nf;

    let mut sigma = Matrix3::zeros();
    for p in iw {
        let v = Vector3::new(p[0], p[1], p[2]);
        sigma += v * v.transpose();
    }
    sigma /= nf;
    sigma -= mu * mu.transpose();

    let a = sigma + Matrix3::identity() * (eps / nf);

    let inv = a
        .try_inverse()
        .unwrap_or_else(|| pseudo_inverse3(&a));

    let centered: Vec<Vector3<f64>> = iw
        .iter()
        .map(|p| Vector3::new(p[0], p[1], p[2]) - mu)
        .collect();
    let transformed: Vec<Vector3<f64>> = centered.iter().map(|c| inv * c).collect();

    let mut v = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            let dot = centered[i].dot(&transformed[j]);
            let delta = if i == j { 1.0 } else { 0.0 };
            v[i * n + j] = delta - (1.0 / nf) * (1.0 + dot);
        }
    }
    v
}

/// Moore-Penrose pseudo-inverse fallback for a singular 3x3 covariance
/// regularization matrix. This path is silent by design (`spec.md` §7):
/// only the top-level solver promotes a failure into a surfaced status.
fn pseudo_inverse3(a: &Matrix3<f64>) -> Matrix3<f64> {
    a.clone()
        .pseudo_inverse(1e-10)
        .unwrap_or_else(|_| Matrix3::zeros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contribution_matrix_is_symmetric_for_generic_window() {
        let iw = [
            [0.1, 0.2, 0.3],
            [0.4, 0.1, 0.2],
            [0.9, 0.8, 0.7],
            [0.2, 0.2, 0.2],
            [0.5, 0.6, 0.4],
            [0.15, 0.25, 0.35],
            [0.6, 0.5, 0.5],
            [0.3, 0.1, 0.05],
            [0.7, 0.6, 0.6],
        ];
        let v = window_contribution(&iw, 1e-7);
        let n = iw.len();
        for i in 0..n {
            for j in 0..n {
                let diff = (v[i * n + j] - v[j * n + i]).abs();
                assert!(diff < 1e-10, "V[{i},{j}] != V[{j},{i}] (diff {diff})");
            }
        }
    }

    #[test]
    fn contribution_matrix_row_sums_to_zero() {
        let iw = [
            [0.1, 0.2, 0.3],
            [0.4, 0.1, 0.2],
            [0.9, 0.8, 0.7],
            [0.2, 0.2, 0.2],
            [0.5, 0.6, 0.4],
            [0.15, 0.25, 0.35],
            [0.6, 0.5, 0.5],
            [0.3, 0.1, 0.05],
            [0.7, 0.6, 0.6],
        ];
        let v = window_contribution(&iw, 1e-7);
        let n = iw.len();
        for i in 0..n {
            let sum: f64 = (0..n).map(|j| v[i * n + j]).sum();
            assert!(sum.abs() < 1e-8, "row {i} sums to {sum}, not ~0");
        }
    }

    #[test]
    fn flat_color_window_degenerates_to_singular_covariance_without_blowing_up() {
        // All pixels identical -> Sigma is exactly zero, exercising the
        // regularizer (and, at eps=0, the pseudo-inverse path).
        let iw = [[0.5, 0.5, 0.5]; 9];
        let v = window_contribution(&iw, 1e-7);
        assert!(v.iter().all(|x| x.is_finite()));
    }
}
