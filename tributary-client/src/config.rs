//! Client configuration
//!
//! Connection settings and the retry policy of the node client. Built by the
//! caller and injected at construction; nothing here is process-wide.

use std::time::Duration;

use crate::Verb;

/// Default base URL of the sidecar fronting the node service
pub const DEFAULT_BASE_URL: &str = "http://localhost:3500";

/// Default path prefix under which node methods are invoked
pub const DEFAULT_METHOD_PREFIX: &str = "v1.0/invoke/nodeapp/method";

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Node client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL (e.g., "http://localhost:3500")
    pub base_url: String,

    /// Path prefix placed between the base URL and the method name
    pub method_prefix: String,

    /// Timeout applied to every single attempt
    pub timeout: Duration,

    /// Retry behaviour for failed calls
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Creates a configuration for `base_url` with default prefix, timeout and retry
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.method_prefix = prefix.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            method_prefix: DEFAULT_METHOD_PREFIX.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Retry policy with capped exponential backoff
///
/// The default is a single attempt: a failed call fails immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first one (>= 1)
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_backoff: Duration,

    /// Upper bound for any single delay
    pub max_backoff: Duration,

    /// Factor applied to the delay after each retry
    pub multiplier: u32,

    /// Whether POST calls may be repeated. Repeating a POST can duplicate
    /// remote side effects such as recorded events.
    pub retry_non_idempotent: bool,
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self::default()
    }

    /// Retries up to `max_attempts` total attempts, starting at `initial_backoff`
    pub fn exponential(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            ..Self::default()
        }
    }

    /// Whether a call with `verb` may be attempted again
    pub fn permits(&self, verb: Verb) -> bool {
        self.max_attempts > 1 && (verb.is_idempotent() || self.retry_non_idempotent)
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = self
            .multiplier
            .max(1)
            .saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2,
            retry_non_idempotent: false,
        }
    }
}
