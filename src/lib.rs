pub mod config;
pub mod error;
pub mod image;
pub mod observer;
pub mod pipeline;
pub mod processing;

pub use config::{PipelineParams, SampleMode};
pub use error::{Axis, PipelineError, Result};
pub use image::Image;
pub use observer::{NullObserver, PipelineObserver};
pub use pipeline::{run_pipeline, PipelineResult};
pub use processing::sampler::PixelArt;
