//! Correlation id DTOs

use serde::{Deserialize, Serialize};

/// Response of `generateCorrelationId`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationIdResponse {
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
}
