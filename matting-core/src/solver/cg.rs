//! Jacobi-preconditioned conjugate gradient, used when the direct
//! Cholesky factorization fails (the system matrix is only guaranteed
//! positive semi-definite, and numerically marginal inputs can tip it
//! into indefinite).

use nalgebra_sparse::CscMatrix;

/// Solve `A x = b` for symmetric positive-definite `A`. Returns `None`
/// if the residual has not dropped below `tolerance` (relative to
/// `||b||`) within `max_iters`.
pub(super) fn solve_jacobi_pcg(
    a: &CscMatrix<f64>,
    b: &[f64],
    tolerance: f64,
    max_iters: usize,
) -> Option<Vec<f64>> {
    let n = b.len();
    let b_norm = norm(b);
    if b_norm == 0.0 {
        return Some(vec![0.0; n]);
    }

    let diag = diagonal(a, n);
    let inv_diag: Vec<f64> = diag
        .iter()
        .map(|&d| if d.abs() > 1e-14 { 1.0 / d } else { 1.0 })
        .collect();

    let mut x = vec![0.0; n];
    let mut r = b.to_vec();
    let mut z = apply_preconditioner(&inv_diag, &r);
    let mut p = z.clone();
    let mut rz_old = dot(&r, &z);

    for _ in 0..max_iters {
        let ap = spmv(a, &p);
        let pap = dot(&p, &ap);
        if pap.abs() < 1e-300 {
            break;
        }
        let alpha = rz_old / pap;
        for i in 0..n {
            x[i] += alpha * p[i];
            r[i] -= alpha * ap[i];
        }

        if norm(&r) / b_norm <= tolerance {
            return Some(x);
        }

        z = apply_preconditioner(&inv_diag, &r);
        let rz_new = dot(&r, &z);
        let beta = rz_new / rz_old;
        for i in 0..n {
            p[i] = z[i] + beta * p[i];
        }
        rz_old = rz_new;
    }

    if norm(&r) / b_norm <= tolerance {
        Some(x)
    } else {
        None
    }
}

fn diagonal(a: &CscMatrix<f64>, n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n];
    for (r, c, v) in a.triplet_iter() {
        if r == c {
            out[r] += v;
        }
    }
    out
}

fn apply_preconditioner(inv_diag: &[f64], r: &[f64]) -> Vec<f64> {
    r.iter().zip(inv_diag).map(|(&ri, &di)| ri * di).collect()
}

fn spmv(a: &CscMatrix<f64>, x: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; x.len()];
    for (r, c, v) in a.triplet_iter() {
        out[r] += v * x[c];
    }
    out
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}
