//! Progress reporting checkpoints
//!
//! The pipeline owns no thread and no UI. It reports percentages through a
//! [`ProgressSink`] supplied by whoever drives it, at fixed checkpoints.

use tracing::{error, info};

/// Receiver of progress checkpoints and fatal errors.
pub trait ProgressSink: Send + Sync {
    /// `percent` is in `0..=100`. An empty message means "same operation as before".
    fn update(&self, percent: f64, message: &str);

    /// Called once when the pipeline gives up.
    fn fatal_error(&self, message: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn update(&self, _percent: f64, _message: &str) {}

    fn fatal_error(&self, _message: &str) {}
}

/// Forwards checkpoints to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn update(&self, percent: f64, message: &str) {
        if message.is_empty() {
            info!(percent = percent.round(), "progress");
        } else {
            info!(percent = percent.round(), "{message}");
        }
    }

    fn fatal_error(&self, message: &str) {
        error!("{message}");
    }
}

/// Adapts a pair of closures into a sink.
pub struct CallbackProgress<F, E> {
    on_update: F,
    on_error: E,
}

impl<F, E> CallbackProgress<F, E>
where
    F: Fn(f64, &str) + Send + Sync,
    E: Fn(&str) + Send + Sync,
{
    pub fn new(on_update: F, on_error: E) -> Self {
        Self { on_update, on_error }
    }
}

impl<F, E> ProgressSink for CallbackProgress<F, E>
where
    F: Fn(f64, &str) + Send + Sync,
    E: Fn(&str) + Send + Sync,
{
    fn update(&self, percent: f64, message: &str) {
        (self.on_update)(percent, message)
    }

    fn fatal_error(&self, message: &str) {
        (self.on_error)(message)
    }
}

/// A handle reporting into a sub-range of a sink.
///
/// Values passed to [`Progress::update`] are always `0..=100` relative to this
/// handle; [`Progress::child`] carves out a nested range so a stage can report
/// its own 0–100 without knowing where it sits in the whole run.
#[derive(Clone, Copy)]
pub struct Progress<'a> {
    sink: &'a dyn ProgressSink,
    start: f64,
    end: f64,
}

impl<'a> Progress<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            start: 0.0,
            end: 100.0,
        }
    }

    pub fn update(&self, value: f64, message: &str) {
        let value = value.clamp(0.0, 100.0);
        self.sink
            .update(self.start + value * (self.end - self.start) / 100.0, message);
    }

    /// A handle whose 0 and 100 map to `start` and `end` of this one.
    pub fn child(&self, start: f64, end: f64) -> Progress<'a> {
        let span = self.end - self.start;
        Progress {
            sink: self.sink,
            start: self.start + start.clamp(0.0, 100.0) * span / 100.0,
            end: self.start + end.clamp(0.0, 100.0) * span / 100.0,
        }
    }

    pub fn fatal_error(&self, message: &str) {
        self.sink.fatal_error(message);
    }
}

impl std::fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}
