//! Scripted transport for exercising entity aggregation without a network.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use serde_json::Value;

use super::{ApiError, Payload, SteamApi};

/// Install a subscriber so `RUST_LOG=debug cargo test` shows fetch activity.
/// Repeat calls are no-ops.
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory [`SteamApi`] implementation. Responses are stubbed per
/// `interface/method` (or `store/endpoint`) key; every call is recorded so
/// tests can assert fetch counts.
#[derive(Default)]
pub(crate) struct MockApi {
    responses: Mutex<HashMap<String, Payload>>,
    calls: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stub(&self, interface: &str, method: &str, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(format!("{}/{}", interface, method), Payload::new(body));
    }

    pub fn stub_store(&self, endpoint: &str, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(format!("store/{}", endpoint), Payload::new(body));
    }

    pub fn calls_to(&self, key: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|recorded| recorded.as_str() == key)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn dispatch(&self, key: String) -> Result<Payload> {
        self.calls.lock().unwrap().push(key.clone());
        self.responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(key).into())
    }
}

impl SteamApi for MockApi {
    async fn call(
        &self,
        interface: &str,
        method: &str,
        _version: &str,
        _params: &[(&str, String)],
    ) -> Result<Payload> {
        self.dispatch(format!("{}/{}", interface, method))
    }

    async fn store_call(&self, endpoint: &str, _params: &[(&str, String)]) -> Result<Payload> {
        self.dispatch(format!("store/{}", endpoint))
    }
}
