//! Public surface of the crate: the [`MattingPipeline`] builder, its
//! request/response types, and [`MattingError`].

mod builder;
mod error;
mod request;

pub use builder::MattingPipeline;
pub use error::MattingError;
pub use request::{
    CancelToken, Parameters, PipelineRequest, PipelineResponse, PipelineStatus, TrimapInput,
};
