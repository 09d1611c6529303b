//! Lineage DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::lineage::LineageRecord;

/// Request of `recordLineage`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordLineageRequest {
    pub dataset: String,
    #[serde(rename = "lineageData")]
    pub lineage_data: LineageRecord,
}

/// Query taking only a dataset (`datasetConfig`, `getLineage`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetQuery {
    pub dataset: String,
}

/// One hop in a lineage graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub input: String,
    pub output: String,
    pub transformation: String,
}

/// Lineage answer of `getLineage`
///
/// Lineage stores answer either with a flat single hop
/// (`input`/`transformation`/`output`) or with a list of edges; every field
/// is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageInfo {
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub transformation: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub row_counts: Option<JsonValue>,
    #[serde(default)]
    pub lineage: Vec<LineageEdge>,
}

impl LineageInfo {
    /// All hops, with the flat form as the first edge when complete
    pub fn edges(&self) -> Vec<LineageEdge> {
        let mut edges = Vec::with_capacity(self.lineage.len() + 1);
        if let (Some(input), Some(transformation), Some(output)) =
            (&self.input, &self.transformation, &self.output)
        {
            edges.push(LineageEdge {
                input: input.clone(),
                output: output.clone(),
                transformation: transformation.clone(),
            });
        }
        edges.extend(self.lineage.iter().cloned());
        edges
    }
}
