use std::time::Duration;

/// Receives a notification between pipeline stages, never from an inner per-row loop.
///
/// This is the non-UI descendant of the GUI ancestor's `ProgressSink`: no throttling,
/// no event-loop hop, just "a stage finished, here's how long it took".
pub trait PipelineObserver: Send + Sync {
    fn on_stage(&self, stage: &str, elapsed: Duration);
}

/// Default observer: does nothing. `run_pipeline` uses this when the caller
/// passes `None`.
pub struct NullObserver;

impl PipelineObserver for NullObserver {
    fn on_stage(&self, _stage: &str, _elapsed: Duration) {}
}
