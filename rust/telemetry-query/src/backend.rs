use crate::query::{ExecutionRequest, ExecutionResponse};
use async_trait::async_trait;

/// Executes compiled queries against the telemetry store.
///
/// Retries and timeouts belong to the implementation; callers await a single attempt.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn execute(&self, request: ExecutionRequest) -> anyhow::Result<ExecutionResponse>;
}
