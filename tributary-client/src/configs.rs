//! Configuration lookups: process, dataset, and DAG configuration

use serde_json::Value as JsonValue;
use tributary_core::domain::dataset::DatasetConfig;
use tributary_core::dto::dag::DagConfigQuery;
use tributary_core::dto::lineage::DatasetQuery;

use crate::error::{InvokeError, Result};
use crate::{NodeApi, Verb, decode, methods, require_object, to_payload};

impl NodeApi {
    // =============================================================================
    // Configuration
    // =============================================================================

    /// Fetch the process configuration
    ///
    /// # Returns
    /// The configuration object as sent by the service
    pub async fn process_config(&self) -> Result<JsonValue> {
        let value = self.call(methods::CONFIG, Verb::Get, None).await?;
        require_object(methods::CONFIG, value)
    }

    /// Fetch the configuration of a dataset
    ///
    /// # Arguments
    /// * `dataset` - Dataset identifier (e.g., "transactions_raw")
    ///
    /// # Returns
    /// The dataset configuration, validated for non-empty locations
    pub async fn dataset_config(&self, dataset: &str) -> Result<DatasetConfig> {
        let payload = to_payload(
            methods::DATASET_CONFIG,
            &DatasetQuery {
                dataset: dataset.to_string(),
            },
        )?;
        let value = self
            .call(methods::DATASET_CONFIG, Verb::Get, Some(payload))
            .await?;

        let config: DatasetConfig = decode(methods::DATASET_CONFIG, value)?;
        config
            .validate()
            .map_err(|msg| InvokeError::data(methods::DATASET_CONFIG, msg))?;
        Ok(config)
    }

    /// Fetch the scheduler configuration of a DAG
    ///
    /// # Arguments
    /// * `dag_id` - The DAG identifier
    pub async fn dag_config(&self, dag_id: &str) -> Result<JsonValue> {
        let payload = to_payload(
            methods::DAG_CONFIG,
            &DagConfigQuery {
                dag_id: dag_id.to_string(),
            },
        )?;
        let value = self
            .call(methods::DAG_CONFIG, Verb::Get, Some(payload))
            .await?;
        require_object(methods::DAG_CONFIG, value)
    }
}
