//! Tributary node client
//!
//! The only point of contact between the pipeline coordinator and the remote
//! node service. Every remote method is a JSON request/response exchange:
//! GET payloads travel as query parameters, POST payloads as a JSON body.
//!
//! Two layers are provided:
//! - [`RemoteInvoker`]: the generic `invoke(method, verb, payload)` contract,
//!   implemented over HTTP by [`NodeClient`] and by stubs in tests
//! - [`NodeApi`]: typed wrappers for each node method on top of any invoker
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tributary_client::{ClientConfig, NodeApi, NodeClient};
//!
//! # async fn example() -> tributary_client::Result<()> {
//! let client = NodeClient::new(ClientConfig::new("http://localhost:3500"));
//! let api = NodeApi::new(Arc::new(client));
//!
//! let dataset = api.dataset_config("transactions_raw").await?;
//! println!("{} -> {}", dataset.source, dataset.destination);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod configs;
mod dags;
pub mod error;
mod events;
mod lineage;

// Re-export commonly used types
pub use config::{ClientConfig, RetryPolicy};
pub use error::{InvokeError, InvokeErrorKind, Result};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Names of the remote methods exposed by the node service
pub mod methods {
    pub const CONFIG: &str = "config";
    pub const DATASET_CONFIG: &str = "datasetConfig";
    pub const GENERATE_CORRELATION_ID: &str = "generateCorrelationId";
    pub const RECORD_EVENT: &str = "recordEvent";
    pub const RECORD_LINEAGE: &str = "recordLineage";
    pub const DAG_CONFIG: &str = "dagConfig";
    pub const TRIGGER_DAG: &str = "triggerDag";
    pub const GET_LINEAGE: &str = "getLineage";
    pub const GET_EVENTS: &str = "getEvents";
}

/// Longest payload rendering written to the call log
const PAYLOAD_SUMMARY_LIMIT: usize = 256;

/// HTTP verb of a node method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    /// GET calls are reads and safe to repeat
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Verb::Get)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verb::Get => f.write_str("GET"),
            Verb::Post => f.write_str("POST"),
        }
    }
}

/// Executes a named remote method
///
/// Implementations never panic on remote failure; every failure is returned as
/// an [`InvokeError`].
#[async_trait]
pub trait RemoteInvoker: Send + Sync {
    /// Calls `method` with `verb`, sending `payload` as query (GET) or body (POST)
    ///
    /// # Returns
    /// The decoded JSON answer; an empty body decodes as `null`
    async fn invoke(
        &self,
        method: &str,
        verb: Verb,
        payload: Option<JsonValue>,
    ) -> Result<JsonValue>;
}

/// HTTP client for the node service
#[derive(Debug, Clone)]
pub struct NodeClient {
    /// Base URL without trailing slash (e.g., "http://localhost:3500")
    base_url: String,
    /// Method prefix without surrounding slashes
    method_prefix: String,
    config: ClientConfig,
    client: Client,
}

impl NodeClient {
    /// Create a new node client
    ///
    /// # Example
    /// ```
    /// use tributary_client::{ClientConfig, NodeClient};
    ///
    /// let client = NodeClient::new(ClientConfig::new("http://localhost:3500"));
    /// assert_eq!(client.base_url(), "http://localhost:3500");
    /// ```
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create a node client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc. The per-call
    /// timeout from `config` is still applied to every request.
    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            method_prefix: config.method_prefix.trim_matches('/').to_string(),
            config,
            client,
        }
    }

    /// Get the base URL of the node service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL of a method
    pub fn method_url(&self, method: &str) -> String {
        if self.method_prefix.is_empty() {
            format!("{}/{}", self.base_url, method)
        } else {
            format!("{}/{}/{}", self.base_url, self.method_prefix, method)
        }
    }

    /// Performs a single attempt
    async fn send_once(
        &self,
        method: &str,
        verb: Verb,
        payload: Option<&JsonValue>,
    ) -> Result<JsonValue> {
        let url = self.method_url(method);

        let request = match verb {
            Verb::Get => {
                let mut request = self.client.get(&url);
                if let Some(payload) = payload {
                    request = request.query(&query_pairs(method, payload)?);
                }
                request
            }
            Verb::Post => {
                let mut request = self.client.post(&url);
                if let Some(payload) = payload {
                    request = request.json(payload);
                }
                request
            }
        };

        let response = request
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        self.handle_response(method, response).await
    }

    fn transport_error(&self, method: &str, error: reqwest::Error) -> InvokeError {
        if error.is_timeout() {
            InvokeError::transport(
                method,
                format!("timed out after {:?}", self.config.timeout),
            )
        } else if error.is_connect() {
            InvokeError::transport(method, format!("connection failed: {}", error))
        } else {
            InvokeError::transport(method, error.to_string())
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle a node response and decode its JSON body
    ///
    /// Non-2xx statuses become protocol errors carrying the response text.
    async fn handle_response(&self, method: &str, response: reqwest::Response) -> Result<JsonValue> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InvokeError::protocol(method, status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        if body.trim().is_empty() {
            return Ok(JsonValue::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| InvokeError::data(method, format!("Failed to parse JSON response: {}", e)))
    }
}

#[async_trait]
impl RemoteInvoker for NodeClient {
    async fn invoke(
        &self,
        method: &str,
        verb: Verb,
        payload: Option<JsonValue>,
    ) -> Result<JsonValue> {
        let summary = summarize(payload.as_ref());
        let retry = &self.config.retry;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let started = Instant::now();
            let outcome = self.send_once(method, verb, payload.as_ref()).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(value) => {
                    debug!(
                        method,
                        verb = %verb,
                        payload = %summary,
                        attempt,
                        elapsed_ms,
                        "Node call succeeded"
                    );
                    return Ok(value);
                }
                Err(err) => {
                    let will_retry = err.is_retryable()
                        && retry.permits(verb)
                        && attempt < retry.max_attempts;

                    warn!(
                        method,
                        verb = %verb,
                        payload = %summary,
                        attempt,
                        elapsed_ms,
                        error = %err,
                        will_retry,
                        "Node call failed"
                    );

                    if !will_retry {
                        return Err(err);
                    }

                    tokio::time::sleep(retry.backoff_for(attempt)).await;
                }
            }
        }
    }
}

/// Typed access to the node methods over any [`RemoteInvoker`]
///
/// Each wrapper serializes its request, calls the invoker, and checks that
/// the answer is non-null and has the expected shape. Methods are grouped by
/// concern across the `configs`, `events`, `lineage` and `dags` modules.
#[derive(Clone)]
pub struct NodeApi {
    invoker: Arc<dyn RemoteInvoker>,
}

impl NodeApi {
    pub fn new(invoker: Arc<dyn RemoteInvoker>) -> Self {
        Self { invoker }
    }

    /// The underlying invoker
    pub fn invoker(&self) -> &Arc<dyn RemoteInvoker> {
        &self.invoker
    }

    async fn call(&self, method: &str, verb: Verb, payload: Option<JsonValue>) -> Result<JsonValue> {
        self.invoker.invoke(method, verb, payload).await
    }
}

/// Serializes a request payload
fn to_payload<T: Serialize>(method: &str, value: &T) -> Result<JsonValue> {
    serde_json::to_value(value)
        .map_err(|e| InvokeError::request(method, format!("Failed to encode payload: {}", e)))
}

/// Decodes a non-null answer into `T`
fn decode<T: DeserializeOwned>(method: &str, value: JsonValue) -> Result<T> {
    if value.is_null() {
        return Err(InvokeError::data(method, "empty response"));
    }
    serde_json::from_value(value)
        .map_err(|e| InvokeError::data(method, format!("unexpected response shape: {}", e)))
}

/// Requires a JSON object answer
fn require_object(method: &str, value: JsonValue) -> Result<JsonValue> {
    match value {
        JsonValue::Object(_) => Ok(value),
        JsonValue::Null => Err(InvokeError::data(method, "empty response")),
        other => Err(InvokeError::data(
            method,
            format!("expected a JSON object, got {}", json_type(&other)),
        )),
    }
}

/// Requires any non-null answer
fn require_present(method: &str, value: JsonValue) -> Result<JsonValue> {
    if value.is_null() {
        return Err(InvokeError::data(method, "empty response"));
    }
    Ok(value)
}

/// Flattens a JSON object into query pairs
///
/// Strings are sent verbatim; other scalars and nested values as JSON text.
/// Null fields are omitted.
fn query_pairs(method: &str, payload: &JsonValue) -> Result<Vec<(String, String)>> {
    let object = payload.as_object().ok_or_else(|| {
        InvokeError::request(
            method,
            format!("GET payload must be a JSON object, got {}", json_type(payload)),
        )
    })?;

    Ok(object
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let rendered = match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect())
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Short rendering of a payload for call logs
fn summarize(payload: Option<&JsonValue>) -> String {
    let Some(payload) = payload else {
        return "-".to_string();
    };
    let text = payload.to_string();
    if text.chars().count() <= PAYLOAD_SUMMARY_LIMIT {
        return text;
    }
    let mut short: String = text.chars().take(PAYLOAD_SUMMARY_LIMIT).collect();
    short.push('…');
    short
}
