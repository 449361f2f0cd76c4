#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Once};
use telemetry_query::{
    backend::ExecutionBackend,
    config::AppConfig,
    query::{ExecutionRequest, ExecutionResponse, QueryEngine},
};

static TRACING_INIT: Once = Once::new();

/// Backend double that replays a canned response and records what it was asked.
pub struct FakeBackend {
    response: Option<ExecutionResponse>,
    seen: Mutex<Vec<Value>>,
}

impl FakeBackend {
    pub fn replying(response: ExecutionResponse) -> Arc<Self> {
        Arc::new(Self {
            response: Some(response),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Requests received so far, as wire JSON.
    pub fn requests(&self) -> Vec<Value> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl ExecutionBackend for FakeBackend {
    async fn execute(&self, request: ExecutionRequest) -> anyhow::Result<ExecutionResponse> {
        self.seen.lock().push(serde_json::to_value(&request)?);
        self.response
            .clone()
            .ok_or_else(|| anyhow!("storage unavailable"))
    }
}

pub fn engine_with(backend: Arc<FakeBackend>) -> QueryEngine {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
    QueryEngine::new(backend, Arc::new(AppConfig::embedded()))
}
