//! Lineage recording and lookup

use serde_json::Value as JsonValue;
use tributary_core::domain::lineage::LineageRecord;
use tributary_core::dto::lineage::{DatasetQuery, LineageInfo, RecordLineageRequest};

use crate::error::Result;
use crate::{NodeApi, Verb, decode, methods, require_present, to_payload};

impl NodeApi {
    /// Record the lineage produced for a dataset
    ///
    /// # Arguments
    /// * `dataset` - Dataset the lineage belongs to
    /// * `lineage` - Input, output, transformation and row count
    pub async fn record_lineage(&self, dataset: &str, lineage: &LineageRecord) -> Result<JsonValue> {
        let payload = to_payload(
            methods::RECORD_LINEAGE,
            &RecordLineageRequest {
                dataset: dataset.to_string(),
                lineage_data: lineage.clone(),
            },
        )?;
        let value = self
            .call(methods::RECORD_LINEAGE, Verb::Post, Some(payload))
            .await?;
        require_present(methods::RECORD_LINEAGE, value)
    }

    /// Fetch the lineage known for a dataset or location
    pub async fn get_lineage(&self, dataset: &str) -> Result<LineageInfo> {
        let payload = to_payload(
            methods::GET_LINEAGE,
            &DatasetQuery {
                dataset: dataset.to_string(),
            },
        )?;
        let value = self
            .call(methods::GET_LINEAGE, Verb::Get, Some(payload))
            .await?;
        decode(methods::GET_LINEAGE, value)
    }
}
