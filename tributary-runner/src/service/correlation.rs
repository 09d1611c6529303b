//! Correlation service
//!
//! Obtains run identifiers from the node service. Ids are never minted
//! locally so concurrent coordinators sharing one backend cannot collide.

use async_trait::async_trait;
use tracing::debug;
use tributary_client::{InvokeError, NodeApi};
use tributary_core::domain::run::CorrelationId;

/// Source of fresh correlation ids
#[async_trait]
pub trait CorrelationSource: Send + Sync {
    /// Returns an id that has never been handed out before
    async fn new_run(&self) -> Result<CorrelationId, InvokeError>;
}

/// Correlation ids generated by the node service
pub struct RemoteCorrelationSource {
    api: NodeApi,
}

impl RemoteCorrelationSource {
    pub fn new(api: NodeApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CorrelationSource for RemoteCorrelationSource {
    async fn new_run(&self) -> Result<CorrelationId, InvokeError> {
        let id = self.api.generate_correlation_id().await?;
        debug!(correlation_id = %id, "Obtained correlation id");
        Ok(id)
    }
}
