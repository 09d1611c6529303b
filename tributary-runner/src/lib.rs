//! Tributary Runner
//!
//! Coordinates data pipeline runs against the node service. A run fetches
//! its configuration, records lifecycle events, triggers the workflow
//! scheduler, processes the dataset and records lineage, each step strictly
//! after the previous one succeeded.
//!
//! Architecture:
//! - Configuration: settings from environment or defaults
//! - Services: correlation ids, event recording, processing, lineage queries
//! - Orchestrator: the step sequence of a single run
//! - Tasks: lineage-tracked scheduler tasks

pub mod config;
pub mod orchestrator;
pub mod service;
pub mod signal;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use orchestrator::{
    EventFailurePolicy, PipelineOrchestrator, PipelineSettings, RunError, RunOutcome, RunReport,
};
