//! DAG DTOs
//!
//! Payloads exchanged with the workflow scheduler through the node service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Query of `dagConfig`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagConfigQuery {
    #[serde(rename = "dagId")]
    pub dag_id: String,
}

/// Run configuration handed to the triggered DAG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagConf {
    pub dataset: String,
    pub correlation_id: String,
    pub requested_at: DateTime<Utc>,
    pub requested_by: String,
}

/// Request of `triggerDag`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDagRequest {
    #[serde(rename = "dagId")]
    pub dag_id: String,
    pub conf: DagConf,
}

/// Acknowledgement of `triggerDag`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<JsonValue>,
}

impl TriggerAck {
    /// Checks the scheduler's verdict
    ///
    /// An ack without a status is accepted; an explicit status other than
    /// `success` is a rejection.
    pub fn accepted(&self) -> Result<(), String> {
        let status = self
            .data
            .as_ref()
            .and_then(|data| data.get("status"))
            .and_then(JsonValue::as_str);

        match status {
            None | Some("success") => Ok(()),
            Some(other) => Err(format!("scheduler reported status '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trigger_ack_verdicts() {
        let ok: TriggerAck = serde_json::from_value(json!({
            "message": "DAG triggered successfully",
            "data": { "status": "success", "execution_date": "2024-05-01T10:00:00Z" }
        }))
        .unwrap();
        assert!(ok.accepted().is_ok());

        let bare: TriggerAck = serde_json::from_value(json!({})).unwrap();
        assert!(bare.accepted().is_ok());

        let rejected: TriggerAck =
            serde_json::from_value(json!({ "data": { "status": "queued_failed" } })).unwrap();
        assert!(rejected.accepted().unwrap_err().contains("queued_failed"));
    }

    #[test]
    fn test_trigger_request_wire_names() {
        let req = TriggerDagRequest {
            dag_id: "example_dag".to_string(),
            conf: DagConf {
                dataset: "transactions_raw".to_string(),
                correlation_id: "corr-1".to_string(),
                requested_at: Utc::now(),
                requested_by: "runner-1".to_string(),
            },
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["dagId"], "example_dag");
        assert_eq!(value["conf"]["dataset"], "transactions_raw");
    }
}
