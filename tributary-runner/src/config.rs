//! Runner configuration
//!
//! Defines all configurable parameters for the runner: how to reach the node
//! service, how calls are retried, and which pipeline to drive.

use anyhow::Context;
use std::str::FromStr;
use std::time::Duration;
use tributary_client::config::{DEFAULT_BASE_URL, DEFAULT_METHOD_PREFIX, DEFAULT_TIMEOUT};
use tributary_client::{ClientConfig, RetryPolicy};
use tributary_core::domain::run::DEFAULT_PIPELINE_NAME;

use crate::orchestrator::{EventFailurePolicy, PipelineSettings};

pub const DEFAULT_DATASET: &str = "transactions_raw";
pub const DEFAULT_DAG_ID: &str = "example_dag";

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity of this runner, sent as `requested_by` when triggering DAGs
    pub instance_id: String,

    /// Node service base URL (e.g., "http://localhost:3500")
    pub node_base_url: String,

    /// Path prefix of node methods
    pub method_prefix: String,

    /// Timeout of a single call attempt
    pub request_timeout: Duration,

    /// Attempts per call, including the first
    pub retry_max_attempts: u32,

    pub retry_initial_backoff: Duration,

    pub retry_max_backoff: Duration,

    /// Whether POST calls may be retried
    pub retry_post: bool,

    pub dataset: String,

    pub pipeline_name: String,

    pub dag_id: String,

    pub event_failure_policy: EventFailurePolicy,

    /// Runs launched side by side by the runner binary
    pub concurrent_runs: usize,
}

impl Config {
    /// Creates a configuration with defaults for everything but the identity
    pub fn new(instance_id: String) -> Self {
        Self {
            instance_id,
            node_base_url: DEFAULT_BASE_URL.to_string(),
            method_prefix: DEFAULT_METHOD_PREFIX.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            retry_max_attempts: 1,
            retry_initial_backoff: Duration::from_millis(500),
            retry_max_backoff: Duration::from_secs(30),
            retry_post: false,
            dataset: DEFAULT_DATASET.to_string(),
            pipeline_name: DEFAULT_PIPELINE_NAME.to_string(),
            dag_id: DEFAULT_DAG_ID.to_string(),
            event_failure_policy: EventFailurePolicy::default(),
            concurrent_runs: 1,
        }
    }

    /// Creates and validates configuration from environment variables
    ///
    /// Every variable is optional, but a set one must parse:
    /// - INSTANCE_ID (default: random uuid)
    /// - NODE_BASE_URL (default: http://localhost:3500)
    /// - NODE_METHOD_PREFIX (default: v1.0/invoke/nodeapp/method)
    /// - REQUEST_TIMEOUT (seconds, default: 5)
    /// - RETRY_MAX_ATTEMPTS (default: 1)
    /// - RETRY_INITIAL_BACKOFF_MS (default: 500)
    /// - RETRY_MAX_BACKOFF_MS (default: 30000)
    /// - RETRY_POST (default: false)
    /// - PIPELINE_DATASET (default: transactions_raw)
    /// - PIPELINE_NAME (default: data_engineering_pipeline)
    /// - PIPELINE_DAG_ID (default: example_dag)
    /// - EVENT_FAILURE_POLICY (continue | abort, default: continue)
    /// - CONCURRENT_RUNS (default: 1)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Creates configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let instance_id = lookup("INSTANCE_ID").unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut config = Self::new(instance_id);

        if let Some(url) = lookup("NODE_BASE_URL") {
            config.node_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(prefix) = lookup("NODE_METHOD_PREFIX") {
            config.method_prefix = prefix;
        }
        if let Some(secs) = parse::<u64>(&lookup, "REQUEST_TIMEOUT")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse::<u32>(&lookup, "RETRY_MAX_ATTEMPTS")? {
            config.retry_max_attempts = attempts;
        }
        if let Some(ms) = parse::<u64>(&lookup, "RETRY_INITIAL_BACKOFF_MS")? {
            config.retry_initial_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&lookup, "RETRY_MAX_BACKOFF_MS")? {
            config.retry_max_backoff = Duration::from_millis(ms);
        }
        if let Some(retry_post) = parse::<bool>(&lookup, "RETRY_POST")? {
            config.retry_post = retry_post;
        }
        if let Some(dataset) = lookup("PIPELINE_DATASET") {
            config.dataset = dataset;
        }
        if let Some(name) = lookup("PIPELINE_NAME") {
            config.pipeline_name = name;
        }
        if let Some(dag_id) = lookup("PIPELINE_DAG_ID") {
            config.dag_id = dag_id;
        }
        if let Some(policy) = lookup("EVENT_FAILURE_POLICY") {
            config.event_failure_policy = policy
                .parse::<EventFailurePolicy>()
                .map_err(|e| anyhow::anyhow!("EVENT_FAILURE_POLICY: {}", e))?;
        }
        if let Some(runs) = parse::<usize>(&lookup, "CONCURRENT_RUNS")? {
            config.concurrent_runs = runs;
        }

        Ok(config)
    }

    /// Reads and validates configuration from `lookup`
    ///
    /// Any malformed or invalid value is an error; nothing falls back to
    /// defaults behind the caller's back.
    pub fn load_from<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::from_lookup(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.instance_id.is_empty() {
            anyhow::bail!("instance_id cannot be empty");
        }

        if !self.node_base_url.starts_with("http://") && !self.node_base_url.starts_with("https://")
        {
            anyhow::bail!("node_base_url must start with http:// or https://");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.retry_max_attempts == 0 {
            anyhow::bail!("retry_max_attempts must be at least 1");
        }

        if self.retry_initial_backoff > self.retry_max_backoff {
            anyhow::bail!("retry_initial_backoff cannot exceed retry_max_backoff");
        }

        if self.dataset.trim().is_empty() {
            anyhow::bail!("dataset cannot be empty");
        }

        if self.pipeline_name.trim().is_empty() {
            anyhow::bail!("pipeline_name cannot be empty");
        }

        if self.dag_id.trim().is_empty() {
            anyhow::bail!("dag_id cannot be empty");
        }

        if self.concurrent_runs == 0 {
            anyhow::bail!("concurrent_runs must be greater than 0");
        }

        Ok(())
    }

    /// Node client settings derived from this configuration
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.node_base_url.clone())
            .with_prefix(self.method_prefix.clone())
            .with_timeout(self.request_timeout)
            .with_retry(RetryPolicy {
                max_attempts: self.retry_max_attempts,
                initial_backoff: self.retry_initial_backoff,
                max_backoff: self.retry_max_backoff,
                retry_non_idempotent: self.retry_post,
                ..RetryPolicy::default()
            })
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            dataset: self.dataset.clone(),
            pipeline_name: self.pipeline_name.clone(),
            dag_id: self.dag_id.clone(),
            requested_by: self.instance_id.clone(),
            event_failure_policy: self.event_failure_policy,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {}: '{}'", key, raw))
        })
        .transpose()
}
