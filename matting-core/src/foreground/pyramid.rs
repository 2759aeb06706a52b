//! Multilevel pyramid machinery backing [`super::ForegroundSolver`].
//!
//! Each level halves resolution (box-filter downsample) until
//! `min(height, width) <= 2`. Per-level refinement solves, independently
//! at every pixel, the 2x2 normal equations that minimize
//! `(I - a*F - (1-a)*B)^2 + lambda*((F-Fbar)^2 + (B-Bbar)^2)` per color
//! channel, where `Fbar`/`Bbar` are the current 3x3 neighborhood means —
//! a local linearization of the same smoothness prior the matting
//! Laplacian encodes, solved directly rather than through the sparse
//! system since `F`/`B` are decoupled per pixel once alpha is fixed.

use rayon::prelude::*;

use crate::types::{Alpha, Image};

pub(super) struct Level {
    pub height: usize,
    pub width: usize,
    pub image: Vec<f64>,
    pub alpha: Vec<f64>,
}

/// Build the pyramid from finest (index 0, the input resolution) to
/// coarsest (last, `min(height, width) <= 2`).
pub(super) fn build_levels(image: &Image, alpha: &Alpha) -> Vec<Level> {
    let mut levels = vec![Level {
        height: image.height(),
        width: image.width(),
        image: image.as_slice().to_vec(),
        alpha: alpha.as_slice().to_vec(),
    }];

    loop {
        let prev = levels.last().unwrap();
        if prev.height.min(prev.width) <= 2 {
            break;
        }
        let next = downsample(prev);
        levels.push(next);
    }

    levels
}

fn downsample(level: &Level) -> Level {
    let height = (level.height / 2).max(1);
    let width = (level.width / 2).max(1);
    let mut image = vec![0.0; height * width * 3];
    let mut alpha = vec![0.0; height * width];

    for y in 0..height {
        for x in 0..width {
            let y0 = (2 * y).min(level.height - 1);
            let y1 = (2 * y + 1).min(level.height - 1);
            let x0 = (2 * x).min(level.width - 1);
            let x1 = (2 * x + 1).min(level.width - 1);
            let taps = [(y0, x0), (y0, x1), (y1, x0), (y1, x1)];

            let mut acc = [0.0; 3];
            let mut a_acc = 0.0;
            for &(ty, tx) in &taps {
                let base = (ty * level.width + tx) * 3;
                acc[0] += level.image[base];
                acc[1] += level.image[base + 1];
                acc[2] += level.image[base + 2];
                a_acc += level.alpha[ty * level.width + tx];
            }
            let out_base = (y * width + x) * 3;
            image[out_base] = acc[0] / 4.0;
            image[out_base + 1] = acc[1] / 4.0;
            image[out_base + 2] = acc[2] / 4.0;
            alpha[y * width + x] = a_acc / 4.0;
        }
    }

    Level {
        height,
        width,
        image,
        alpha,
    }
}

/// Nearest-neighbor upsample of an RGB buffer from `(src_h, src_w)` to
/// `(dst_h, dst_w)`, used to seed the next (finer) level's initial guess.
pub(super) fn upsample(
    src: &[f64],
    src_h: usize,
    src_w: usize,
    dst_h: usize,
    dst_w: usize,
) -> Vec<f64> {
    let mut out = vec![0.0; dst_h * dst_w * 3];
    for y in 0..dst_h {
        let sy = (y * src_h / dst_h).min(src_h - 1);
        for x in 0..dst_w {
            let sx = (x * src_w / dst_w).min(src_w - 1);
            let src_base = (sy * src_w + sx) * 3;
            let dst_base = (y * dst_w + x) * 3;
            out[dst_base] = src[src_base];
            out[dst_base + 1] = src[src_base + 1];
            out[dst_base + 2] = src[src_base + 2];
        }
    }
    out
}

/// Run up to `max_iters` Jacobi sweeps of the local 2x2 normal-equation
/// solve over every pixel of `level`, updating `fg`/`bg` in place.
pub(super) fn refine_level(
    level: &Level,
    fg: &mut Vec<f64>,
    bg: &mut Vec<f64>,
    lambda: f64,
    max_iters: usize,
) {
    let h = level.height;
    let w = level.width;
    debug_assert_eq!(fg.len(), h * w * 3);
    debug_assert_eq!(bg.len(), h * w * 3);

    for _ in 0..max_iters {
        let fg_prev = fg.clone();
        let bg_prev = bg.clone();

        let rows: Vec<(Vec<f64>, Vec<f64>)> = (0..h)
            .into_par_iter()
            .map(|y| {
                let mut fg_row = vec![0.0; w * 3];
                let mut bg_row = vec![0.0; w * 3];
                for x in 0..w {
                    let idx = y * w + x;
                    let a = level.alpha[idx];
                    let (fbar, bbar) = neighborhood_means(&fg_prev, &bg_prev, h, w, y, x);
                    for c in 0..3 {
                        let i = level.image[idx * 3 + c];
                        let (f, b) = solve_local_2x2(a, i, fbar[c], bbar[c], lambda);
                        fg_row[x * 3 + c] = f;
                        bg_row[x * 3 + c] = b;
                    }
                }
                (fg_row, bg_row)
            })
            .collect();

        for (y, (fg_row, bg_row)) in rows.into_iter().enumerate() {
            fg[y * w * 3..(y + 1) * w * 3].copy_from_slice(&fg_row);
            bg[y * w * 3..(y + 1) * w * 3].copy_from_slice(&bg_row);
        }
    }
}

fn neighborhood_means(
    fg: &[f64],
    bg: &[f64],
    height: usize,
    width: usize,
    y: usize,
    x: usize,
) -> ([f64; 3], [f64; 3]) {
    let mut f_sum = [0.0; 3];
    let mut b_sum = [0.0; 3];
    let mut n = 0.0;
    for dy in -1isize..=1 {
        let ny = y as isize + dy;
        if ny < 0 || ny >= height as isize {
            continue;
        }
        for dx in -1isize..=1 {
            let nx = x as isize + dx;
            if nx < 0 || nx >= width as isize {
                continue;
            }
            let idx = (ny as usize * width + nx as usize) * 3;
            for c in 0..3 {
                f_sum[c] += fg[idx + c];
                b_sum[c] += bg[idx + c];
            }
            n += 1.0;
        }
    }
    (
        [f_sum[0] / n, f_sum[1] / n, f_sum[2] / n],
        [b_sum[0] / n, b_sum[1] / n, b_sum[2] / n],
    )
}

/// Solve the 2x2 system for one channel:
/// `[[a^2+lambda, a(1-a)], [a(1-a), (1-a)^2+lambda]] [F,B]^T =
///  [a*i+lambda*fbar, (1-a)*i+lambda*bbar]^T`.
fn solve_local_2x2(a: f64, i: f64, fbar: f64, bbar: f64, lambda: f64) -> (f64, f64) {
    let ia = 1.0 - a;
    let m00 = a * a + lambda;
    let m01 = a * ia;
    let m11 = ia * ia + lambda;
    let r0 = a * i + lambda * fbar;
    let r1 = ia * i + lambda * bbar;

    let det = m00 * m11 - m01 * m01;
    if det.abs() < 1e-12 {
        return (fbar, bbar);
    }
    let f = (m11 * r0 - m01 * r1) / det;
    let b = (m00 * r1 - m01 * r0) / det;
    (f, b)
}
