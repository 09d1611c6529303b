//! Processing strategies
//!
//! The data processing step is the one step that does not call the node
//! service. Its outcome feeds the lineage record.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::info;
use tributary_core::domain::dataset::DatasetConfig;

/// Result of processing a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingOutcome {
    pub rows_processed: u64,
    pub duration: Duration,
}

/// Processes a dataset
///
/// Processing never fails; a strategy that cannot process reports zero rows.
#[async_trait]
pub trait ProcessingStrategy: Send + Sync {
    async fn process(&self, dataset: &DatasetConfig) -> ProcessingOutcome;
}

/// Stand-in for real processing: draws a plausible row count and duration
///
/// Rows fall in [1_000, 1_000_000] and duration in [0.5s, 5s]. Nothing is
/// slept; the duration is only reported.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedProcessing;

impl SimulatedProcessing {
    fn draw() -> ProcessingOutcome {
        let mut rng = rand::rng();
        ProcessingOutcome {
            rows_processed: rng.random_range(1_000..=1_000_000),
            duration: Duration::from_millis(rng.random_range(500..=5_000)),
        }
    }
}

#[async_trait]
impl ProcessingStrategy for SimulatedProcessing {
    async fn process(&self, dataset: &DatasetConfig) -> ProcessingOutcome {
        let outcome = Self::draw();
        info!(
            dataset = %dataset.name,
            source = %dataset.source,
            destination = %dataset.destination,
            rows_processed = outcome.rows_processed,
            duration_ms = outcome.duration.as_millis() as u64,
            "Processed dataset"
        );
        outcome
    }
}

/// Always reports the same outcome
#[derive(Debug, Clone, Copy)]
pub struct FixedProcessing {
    outcome: ProcessingOutcome,
}

impl FixedProcessing {
    pub fn new(rows_processed: u64, duration: Duration) -> Self {
        Self {
            outcome: ProcessingOutcome {
                rows_processed,
                duration,
            },
        }
    }
}

#[async_trait]
impl ProcessingStrategy for FixedProcessing {
    async fn process(&self, _dataset: &DatasetConfig) -> ProcessingOutcome {
        self.outcome
    }
}
