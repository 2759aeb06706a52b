//! Closed-form alpha matting.
//!
//! This crate implements the Levin et al. closed-form matting algorithm:
//! given an image and a coarse trimap (or a soft mask the crate turns
//! into one), it assembles the sparse matting Laplacian, solves a
//! confidence-weighted linear system for alpha over the unknown region,
//! and unmixes the foreground color layer from the result.
//!
//! The pipeline is organized as five independently testable stages,
//! each its own module: [`window`] (sliding-window indexing),
//! [`laplacian`] (Laplacian assembly), [`trimap`] (trimap construction),
//! [`solver`] (the constrained alpha solve) and [`foreground`] (color
//! unmixing). [`pipeline`] wires them together behind the public
//! [`MattingPipeline`] builder.
//!
//! # Quick start
//!
//! ```no_run
//! use matting_core::{MattingPipeline, PipelineRequest, TrimapInput, Image, Mask};
//!
//! # fn example(image: Image, mask: Mask) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = MattingPipeline::new();
//! let request = PipelineRequest::new(image, TrimapInput::Mask(mask));
//! let response = pipeline.run(&request)?;
//! let _alpha = response.alpha;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod foreground;
pub mod laplacian;
pub mod morph;
pub mod pipeline;
pub mod solver;
pub mod trimap;
pub mod types;
pub mod window;

pub use api::{
    CancelToken, MattingError, MattingPipeline, Parameters, PipelineRequest, PipelineResponse,
    PipelineStatus, TrimapInput,
};
pub use types::{encode_rgba8, Alpha, Foreground, Image, Mask, Trimap};

#[cfg(test)]
mod domain_tests;
