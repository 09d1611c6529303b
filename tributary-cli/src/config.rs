//! Configuration module
//!
//! Connection settings of the CLI, taken from flags or the environment.

use std::sync::Arc;
use std::time::Duration;
use tributary_client::{ClientConfig, NodeApi, NodeClient, RemoteInvoker, RetryPolicy};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the node service
    pub node_url: String,
    pub method_prefix: String,
    pub timeout_secs: u64,
    pub attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Whether POST calls may be retried
    pub retry_post: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.node_url.starts_with("http://") && !self.node_url.starts_with("https://") {
            anyhow::bail!("node URL must start with http:// or https://");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout must be greater than 0");
        }
        if self.attempts == 0 {
            anyhow::bail!("attempts must be at least 1");
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            anyhow::bail!("initial backoff cannot exceed max backoff");
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        let retry = RetryPolicy {
            max_attempts: self.attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            retry_non_idempotent: self.retry_post,
            ..RetryPolicy::default()
        };
        ClientConfig::new(self.node_url.trim_end_matches('/'))
            .with_prefix(self.method_prefix.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry(retry)
    }

    pub fn invoker(&self) -> Arc<dyn RemoteInvoker> {
        Arc::new(NodeClient::new(self.client_config()))
    }

    pub fn api(&self) -> NodeApi {
        NodeApi::new(self.invoker())
    }
}
