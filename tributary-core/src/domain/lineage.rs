//! Lineage domain types

use serde::{Deserialize, Serialize};

use crate::domain::dataset::DatasetConfig;

/// Lineage produced by one run: where data came from, where it went, and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageRecord {
    pub input: String,
    pub output: String,
    pub transformation: String,
    #[serde(default)]
    pub rows_processed: u64,
}

impl LineageRecord {
    /// Lineage of a pipeline that moved `rows_processed` rows from the
    /// dataset's source to its destination
    pub fn for_dataset(
        config: &DatasetConfig,
        transformation: impl Into<String>,
        rows_processed: u64,
    ) -> Self {
        Self {
            input: config.source.clone(),
            output: config.destination.clone(),
            transformation: transformation.into(),
            rows_processed,
        }
    }
}
