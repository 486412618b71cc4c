//! Outbound Ports (Driven Ports / SPI)

use crate::domain::errors::RecordSinkError;
use async_trait::async_trait;
use shared_types::{
    AdapterError, DispatchRecord, Payload, PayloadResult, Strategy, TargetId, Timestamp,
};

/// Backend that runs a job's payload.
///
/// Retries, if any, are the adapter's business. The orchestrator enforces
/// `deadline` itself and records whatever comes back verbatim.
#[async_trait]
pub trait ExecutionAdapter: Send + Sync {
    async fn execute(
        &self,
        target_id: &TargetId,
        strategy: Strategy,
        payload: Payload,
        deadline: Timestamp,
    ) -> Result<PayloadResult, AdapterError>;
}

/// Append-only history of completed dispatch records.
pub trait RecordSink: Send + Sync {
    fn append(&self, record: &DispatchRecord) -> Result<(), RecordSinkError>;

    /// Everything appended so far, in append order.
    fn records(&self) -> Vec<DispatchRecord>;
}
