//! dbt model task

use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use tributary_core::domain::lineage::LineageRecord;

use super::{TaskContext, TaskError, TaskOutput, TrackedTask};

/// Builds dbt models and reports their lineage
///
/// Models can be overridden per run with a `models` parameter holding a list
/// of model names.
#[derive(Debug, Clone)]
pub struct DbtTask {
    id: String,
    models: Vec<String>,
    lineage: LineageRecord,
}

impl DbtTask {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            models: vec!["model1".to_string(), "model2".to_string()],
            lineage: LineageRecord {
                input: "raw_data".to_string(),
                output: "transformed_data".to_string(),
                transformation: "dbt_models".to_string(),
                rows_processed: 0,
            },
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    fn models_for(&self, ctx: &TaskContext) -> Result<Vec<String>, TaskError> {
        let Some(value) = ctx.params.get("models") else {
            return Ok(self.models.clone());
        };

        let models: Vec<String> = value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        if models.is_empty() {
            return Err(TaskError::Failed {
                task_id: self.id.clone(),
                message: "no dbt models selected".to_string(),
            });
        }
        Ok(models)
    }
}

#[async_trait]
impl TrackedTask for DbtTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &'static str {
        "dbt"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
        let models = self.models_for(ctx)?;
        info!(task_id = %self.id, models = ?models, "Executing dbt models");

        Ok(TaskOutput::success(self.lineage.clone()).with_detail("models", json!(models)))
    }
}
