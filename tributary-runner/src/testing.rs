//! Scripted node service for unit tests

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tributary_client::{InvokeError, RemoteInvoker, Result, Verb, methods};

/// One invocation seen by the stub
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub method: String,
    pub verb: Verb,
    pub payload: Option<JsonValue>,
}

/// In-memory stand-in for the node service
///
/// Answers every method with canned data, stores recorded events so
/// `getEvents` returns them, and fails or nulls methods on request.
pub(crate) struct StubNode {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
    failing: HashSet<String>,
    failing_events: HashSet<String>,
    nulls: HashSet<String>,
    dataset: JsonValue,
    events: Mutex<HashMap<(String, String), Vec<String>>>,
}

impl StubNode {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(0),
            failing: HashSet::new(),
            failing_events: HashSet::new(),
            nulls: HashSet::new(),
            dataset: json!({
                "name": "transactions_raw",
                "source": "s3://raw",
                "destination": "s3://clean",
                "schema": ["id", "ts", "amt"],
                "partitions": ["dt"]
            }),
            events: Mutex::new(HashMap::new()),
        }
    }

    /// Answers `method` with a 500
    pub fn fail_on(mut self, method: &str) -> Self {
        self.failing.insert(method.to_string());
        self
    }

    /// Answers `recordEvent` with a 500 for events of `status`
    pub fn fail_event(mut self, status: &str) -> Self {
        self.failing_events.insert(status.to_string());
        self
    }

    /// Answers `method` with an empty body
    pub fn null_on(mut self, method: &str) -> Self {
        self.nulls.insert(method.to_string());
        self
    }

    pub fn with_dataset(mut self, dataset: JsonValue) -> Self {
        self.dataset = dataset;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.method).collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|call| call.method == method).count()
    }

    /// Payloads of `method`, in call order
    pub fn payloads(&self, method: &str) -> Vec<JsonValue> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .filter_map(|call| call.payload)
            .collect()
    }

    /// Statuses of the events that reached the store, in order
    pub fn event_statuses(&self) -> Vec<String> {
        self.payloads(methods::RECORD_EVENT)
            .iter()
            .filter(|event| !self.event_fails(event))
            .filter_map(|event| event["status"].as_str().map(str::to_string))
            .collect()
    }

    fn event_fails(&self, event: &JsonValue) -> bool {
        event["status"]
            .as_str()
            .is_some_and(|status| self.failing_events.contains(status))
    }

    fn record_event(&self, event: JsonValue) -> Result<JsonValue> {
        if self.event_fails(&event) {
            return Err(InvokeError::protocol(
                methods::RECORD_EVENT,
                500,
                "state store unavailable",
            ));
        }

        let key = (
            event["dataset"].as_str().unwrap_or_default().to_string(),
            event["correlationId"].as_str().unwrap_or_default().to_string(),
        );
        self.events
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push(event.to_string());

        Ok(json!({ "message": "Event recorded successfully", "event": event }))
    }

    fn get_events(&self, query: &JsonValue) -> JsonValue {
        let key = (
            query["dataset"].as_str().unwrap_or_default().to_string(),
            query["correlationId"].as_str().unwrap_or_default().to_string(),
        );
        match self.events.lock().unwrap().get(&key) {
            Some(stored) => json!(stored),
            None => JsonValue::Null,
        }
    }
}

#[async_trait]
impl RemoteInvoker for StubNode {
    async fn invoke(
        &self,
        method: &str,
        verb: Verb,
        payload: Option<JsonValue>,
    ) -> Result<JsonValue> {
        self.calls.lock().unwrap().push(Call {
            method: method.to_string(),
            verb,
            payload: payload.clone(),
        });

        if self.failing.contains(method) {
            return Err(InvokeError::protocol(method, 500, "stubbed failure"));
        }
        if self.nulls.contains(method) {
            return Ok(JsonValue::Null);
        }

        let payload = payload.unwrap_or_default();
        match method {
            methods::CONFIG => Ok(json!({
                "environment": "test",
                "pipelines": ["data_engineering_pipeline"]
            })),
            methods::DATASET_CONFIG => Ok(self.dataset.clone()),
            methods::GENERATE_CORRELATION_ID => {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(json!({ "correlationId": format!("corr-{}", n) }))
            }
            methods::RECORD_EVENT => self.record_event(payload),
            methods::GET_EVENTS => Ok(self.get_events(&payload)),
            methods::RECORD_LINEAGE => Ok(json!({ "message": "Lineage recorded successfully" })),
            methods::DAG_CONFIG => Ok(json!({
                "dag_id": payload["dagId"],
                "schedule_interval": "@daily"
            })),
            methods::TRIGGER_DAG => Ok(json!({
                "message": "DAG triggered successfully",
                "data": { "status": "success", "dag_run_id": "manual__2024-05-01" }
            })),
            methods::GET_LINEAGE => Ok(json!({
                "dataset": payload["dataset"],
                "lineage": [{
                    "input": "s3://raw",
                    "output": "s3://clean",
                    "transformation": "data_engineering_pipeline"
                }]
            })),
            other => Err(InvokeError::protocol(other, 404, "method not found")),
        }
    }
}
