//! Service layer
//!
//! Services wrap the node methods the orchestrator consults at every step
//! boundary: correlation ids, event recording, data processing, and lineage
//! queries.
//!
//! Services with more than one plausible implementation are trait-based to
//! enable testing and dependency injection.

mod correlation;
mod lineage;
mod processing;
mod recorder;

// Re-export traits
pub use correlation::CorrelationSource;
pub use processing::ProcessingStrategy;

// Re-export implementations
pub use correlation::RemoteCorrelationSource;
pub use lineage::LineageQuery;
pub use processing::{FixedProcessing, ProcessingOutcome, SimulatedProcessing};
pub use recorder::EventRecorder;
