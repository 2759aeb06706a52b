//! CLI-facing error type.
//!
//! Unlike `matting-core`'s hand-rolled [`matting_core::MattingError`]
//! (kept dependency-minimal since it's the algorithm core), the host
//! binary is already pulling in a full I/O/serialization stack, so it
//! uses `thiserror` the way the reference app's `src/error.rs` does.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read image {path}: {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write image {path}: {source}")]
    WriteImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("mask and image dimensions disagree: image is {image_w}x{image_h}, mask is {mask_w}x{mask_h}")]
    DimensionMismatch {
        image_w: u32,
        image_h: u32,
        mask_w: u32,
        mask_h: u32,
    },

    #[error(transparent)]
    Matting(#[from] matting_core::MattingError),
}
