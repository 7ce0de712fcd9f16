use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use forgeiq_dashboard::{
    ClientError,
    domain::ApiPath,
    transport::{Method, Transport},
};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Scripted backend: one canned answer per route, every call recorded.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, Result<Value, ClientError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Mutex<Duration>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, body: Value) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Ok(body));
    }

    pub fn fail(&self, path: &str, error: ClientError) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Err(error));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

pub fn unreachable() -> ClientError {
    ClientError::Transport {
        cause: "connection failed: Connection refused (os error 111)".to_string(),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(
        &self,
        method: Method,
        path: &ApiPath,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            params: params.to_vec(),
            body: body.cloned(),
        });

        // answered with the state as of arrival, however long the reply takes
        let answer = self
            .routes
            .lock()
            .unwrap()
            .get(path.as_str())
            .cloned()
            .unwrap_or_else(|| {
                Err(ClientError::Backend {
                    status_code: 404,
                    message: "Not Found".to_string(),
                    raw_body: String::new(),
                })
            });

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        answer
    }
}
