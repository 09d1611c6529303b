//! DAG triggering

use tributary_core::dto::dag::{TriggerAck, TriggerDagRequest};

use crate::error::{InvokeError, Result};
use crate::{NodeApi, Verb, decode, methods, to_payload};

impl NodeApi {
    /// Ask the workflow scheduler to run a DAG
    ///
    /// # Arguments
    /// * `req` - DAG id and run configuration
    ///
    /// # Returns
    /// The scheduler acknowledgement. An ack reporting a status other than
    /// `success` is returned as a data error.
    pub async fn trigger_dag(&self, req: &TriggerDagRequest) -> Result<TriggerAck> {
        let payload = to_payload(methods::TRIGGER_DAG, req)?;
        let value = self
            .call(methods::TRIGGER_DAG, Verb::Post, Some(payload))
            .await?;

        let ack: TriggerAck = decode(methods::TRIGGER_DAG, value)?;
        ack.accepted()
            .map_err(|msg| InvokeError::data(methods::TRIGGER_DAG, msg))?;
        Ok(ack)
    }
}
