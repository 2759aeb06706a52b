//! Unified error type for the matting-core public API.
//!
//! [`MattingError`] wraps every failure mode the pipeline can surface into
//! a single enum for convenient `?` propagation in host code.
//!
//! Hand-rolled rather than `thiserror`-derived, matching the teacher's
//! own split: `eink-dither` (the pure algorithm crate a larger host
//! wraps) hand-rolls `DitherError`'s `Display`/`Error` impls and stays
//! off `thiserror` even though the host app depends on it. This crate
//! follows that same split.

use std::fmt;

/// Unified error type for the matting-core public API.
///
/// See the crate-level documentation for which stages can produce which
/// variant.
#[derive(Debug, Clone)]
pub enum MattingError {
    /// Height/width too small for the requested window radius, or a
    /// buffer length that does not match `height * width * channels`.
    InvalidDimensions {
        /// Human-readable detail (which buffer, expected vs. actual length).
        detail: String,
    },

    /// A parameter is out of its valid range (e.g. a threshold outside
    /// `[0, 255]`, or `win_rad == 0`).
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Human-readable detail.
        detail: String,
    },

    /// The sparse solve did not converge (direct factorization failed and
    /// the conjugate-gradient fallback exceeded its iteration budget).
    ///
    /// Non-fatal: carries the degraded alpha (the prior trimap, clamped)
    /// that the pipeline substituted.
    SolverFallback {
        /// The trimap, clamped to `[0,1]`, used in place of a converged
        /// solve.
        alpha: Vec<f64>,
    },

    /// Cooperative cancellation was observed at a stage boundary.
    Cancelled,

    /// Anything else: numerical blow-up not caught by the regularizer,
    /// allocation failure, or an invariant violation.
    Internal {
        /// Human-readable detail.
        detail: String,
    },
}

impl fmt::Display for MattingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MattingError::InvalidDimensions { detail } => {
                write!(f, "invalid dimensions: {detail}")
            }
            MattingError::InvalidParameter { name, detail } => {
                write!(f, "invalid parameter `{name}`: {detail}")
            }
            MattingError::SolverFallback { .. } => {
                write!(f, "solver did not converge, fell back to the prior trimap")
            }
            MattingError::Cancelled => write!(f, "cancelled"),
            MattingError::Internal { detail } => write!(f, "internal error: {detail}"),
        }
    }
}

impl std::error::Error for MattingError {}
