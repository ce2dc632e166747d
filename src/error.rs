use thiserror::Error;

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Typed failure modes of the pipeline, per §7.
///
/// Validation errors (`InvalidDimensions`, `InvalidParameter`) are always reported
/// synchronously at `run_pipeline` entry, before any buffer is allocated.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Peak detection produced fewer than two lines on an axis while the caller
    /// required a grid. Not fatal: the caller may retry with looser thresholds
    /// or switch to direct mode.
    #[error("empty detection on {axis} axis: found {found} line(s), need at least 2")]
    EmptyDetection { axis: Axis, found: usize },

    #[error("allocation of {requested} bytes exceeds the {limit} byte limit")]
    AllocationFailure { requested: usize, limit: usize },
}

/// Which image axis a per-axis error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
        })
    }
}
