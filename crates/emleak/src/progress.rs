//! Progress notifications and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::info;

/// Emitted periodically while a pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// 0 for the initial run, `r` for the run after the r-th shielding.
    pub pass: usize,
    /// Steps completed in this pass.
    pub completed: usize,
    /// Steps per pass.
    pub total: usize,
    /// `completed * 100 / total`, rounded down.
    pub percent: usize,
}

impl ProgressEvent {
    pub fn new(pass: usize, completed: usize, total: usize) -> Self {
        Self {
            pass,
            completed,
            total,
            percent: completed * 100 / total.max(1),
        }
    }
}

/// Receiver for progress notifications. Purely observational: nothing a sink
/// does can change the simulation.
pub trait ProgressSink: Send {
    fn on_progress(&mut self, event: &ProgressEvent);

    /// Called once when a pass has executed all of its steps.
    fn on_pass_complete(&mut self, _pass: usize, _steps: usize) {}
}

/// Logs progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_progress(&mut self, event: &ProgressEvent) {
        info!(
            pass = event.pass,
            step = event.completed,
            total = event.total,
            "simulation progress: {}%",
            event.percent
        );
    }

    fn on_pass_complete(&mut self, pass: usize, steps: usize) {
        info!(pass, steps, "simulation pass completed");
    }
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _event: &ProgressEvent) {}
}

/// Records events in a shared buffer; clones observe the same buffer.
#[derive(Debug, Clone, Default)]
pub struct ProgressLog {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
    completed_passes: Arc<Mutex<Vec<usize>>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        lock(&self.events).clone()
    }

    pub fn completed_passes(&self) -> Vec<usize> {
        lock(&self.completed_passes).clone()
    }
}

/// Recovers the recorded data behind a poisoned lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ProgressSink for ProgressLog {
    fn on_progress(&mut self, event: &ProgressEvent) {
        lock(&self.events).push(*event);
    }

    fn on_pass_complete(&mut self, pass: usize, _steps: usize) {
        lock(&self.completed_passes).push(pass);
    }
}

/// Shared cancellation flag, checked by the controller between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
