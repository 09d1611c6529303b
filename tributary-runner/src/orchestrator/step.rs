//! Pipeline steps

use std::fmt;

/// Number of steps an operator sees
///
/// `FetchDagConfig` and `TriggerDag` are reported together as one step.
pub const VISIBLE_STEPS: usize = 8;

/// States of a pipeline run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    FetchProcessConfig,
    FetchDatasetConfig,
    RecordStart,
    FetchDagConfig,
    TriggerDag,
    ProcessData,
    RecordLineage,
    QueryLineage,
    RecordEnd,
}

impl Step {
    /// Every step, in execution order
    pub const ALL: [Step; 9] = [
        Step::FetchProcessConfig,
        Step::FetchDatasetConfig,
        Step::RecordStart,
        Step::FetchDagConfig,
        Step::TriggerDag,
        Step::ProcessData,
        Step::RecordLineage,
        Step::QueryLineage,
        Step::RecordEnd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::FetchProcessConfig => "fetch_process_config",
            Step::FetchDatasetConfig => "fetch_dataset_config",
            Step::RecordStart => "record_start",
            Step::FetchDagConfig => "fetch_dag_config",
            Step::TriggerDag => "trigger_dag",
            Step::ProcessData => "process_data",
            Step::RecordLineage => "record_lineage",
            Step::QueryLineage => "query_lineage",
            Step::RecordEnd => "record_end",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Step::FetchProcessConfig => "Fetch process configuration",
            Step::FetchDatasetConfig => "Fetch dataset configuration",
            Step::RecordStart => "Record start event",
            Step::FetchDagConfig => "Fetch DAG configuration",
            Step::TriggerDag => "Trigger DAG",
            Step::ProcessData => "Process data",
            Step::RecordLineage => "Record lineage",
            Step::QueryLineage => "Query lineage",
            Step::RecordEnd => "Record end event",
        }
    }

    /// Whether finishing this step advances the visible progress counter
    pub fn completes_visible_step(&self) -> bool {
        !matches!(self, Step::FetchDagConfig)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
