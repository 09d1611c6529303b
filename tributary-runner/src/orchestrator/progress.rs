//! Progress reporting
//!
//! The orchestrator fires a callback on every state transition instead of
//! pacing itself; presentation is up to the reporter.

use tracing::{info, warn};
use tributary_client::InvokeError;

use super::step::{Step, VISIBLE_STEPS};

/// Snapshot of run progress after a step completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub step: Step,
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(step: Step, completed: usize) -> Self {
        Self {
            step,
            completed,
            total: VISIBLE_STEPS,
        }
    }

    /// Completion ratio in [0, 1]
    pub fn fraction(&self) -> f64 {
        self.completed as f64 / self.total as f64
    }
}

/// Receives step transitions of a run
pub trait ProgressReporter: Send + Sync {
    /// Called after each successful transition
    fn step_completed(&self, progress: &Progress);

    /// Called once when a step fails and halts the run
    fn step_failed(&self, _step: Step, _error: &InvokeError) {}
}

/// Closures work as reporters for the success path
impl<F> ProgressReporter for F
where
    F: Fn(&Progress) + Send + Sync,
{
    fn step_completed(&self, progress: &Progress) {
        self(progress)
    }
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn step_completed(&self, _progress: &Progress) {}
}

/// Writes progress to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn step_completed(&self, progress: &Progress) {
        info!(
            step = %progress.step,
            completed = progress.completed,
            total = progress.total,
            "{}",
            progress.step.label()
        );
    }

    fn step_failed(&self, step: Step, error: &InvokeError) {
        warn!(step = %step, error = %error, "Step failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_fraction() {
        let progress = Progress::new(Step::RecordStart, 2);
        assert_eq!(progress.total, 8);
        assert!((progress.fraction() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_closure_reporter() {
        let seen = Mutex::new(Vec::new());
        let reporter = |progress: &Progress| seen.lock().unwrap().push(progress.completed);

        reporter.step_completed(&Progress::new(Step::FetchProcessConfig, 1));
        reporter.step_completed(&Progress::new(Step::FetchDatasetConfig, 2));

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
