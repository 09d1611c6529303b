//! Spark job task

use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use tributary_core::domain::lineage::LineageRecord;

use super::{TaskContext, TaskError, TaskOutput, TrackedTask};

const DEFAULT_JOB_ID: &str = "spark_job_123";

/// Submits a Spark aggregation job
///
/// The submitted job id is taken from the `job_id` parameter when present.
#[derive(Debug, Clone)]
pub struct SparkTask {
    id: String,
    lineage: LineageRecord,
}

impl SparkTask {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lineage: LineageRecord {
                input: "transformed_data".to_string(),
                output: "aggregated_data".to_string(),
                transformation: "spark_aggregation".to_string(),
                rows_processed: 0,
            },
        }
    }
}

#[async_trait]
impl TrackedTask for SparkTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &'static str {
        "spark"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
        let job_id = ctx.param_str("job_id").unwrap_or(DEFAULT_JOB_ID);
        if job_id.trim().is_empty() {
            return Err(TaskError::MissingParam {
                task_id: self.id.clone(),
                param: "job_id".to_string(),
            });
        }

        info!(task_id = %self.id, job_id, "Submitting Spark job");
        Ok(TaskOutput::success(self.lineage.clone()).with_detail("job_id", json!(job_id)))
    }
}
