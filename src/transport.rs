use std::error::Error as _;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

pub use reqwest::Method;

use crate::{
    config::{ConfigError, Settings},
    domain::{ApiKey, ApiPath, BaseUrl},
    error::ClientError,
};

const USER_AGENT: &str = concat!("forgeiq-dashboard/", env!("CARGO_PKG_VERSION"));

/// One JSON request/response round trip against the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &ApiPath,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError>;
}

/// reqwest-backed transport. Base address and credential are fixed at construction.
pub struct HttpTransport {
    base_url: BaseUrl,
    api_key: Option<ApiKey>,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigError::ClientBuild(e.to_string()))?;

        Ok(Self {
            base_url: settings.api_base_url.clone(),
            api_key: settings.api_key.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }
}

/// Flattens the error and its sources, reqwest hides the interesting part in the chain.
fn transport_error(error: reqwest::Error) -> ClientError {
    let mut cause = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    };

    let mut source = error.source();
    while let Some(inner) = source {
        cause.push_str(": ");
        cause.push_str(&inner.to_string());
        source = inner.source();
    }

    ClientError::Transport { cause }
}

/// Picks the human readable part of an error body, falling back to the reason phrase.
fn backend_message(status: StatusCode, raw_body: &str) -> String {
    serde_json::from_str::<Value>(raw_body)
        .ok()
        .and_then(|body| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        })
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(name = "transport::request", skip(self, params, body))]
    async fn request(
        &self,
        method: Method,
        path: &ApiPath,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let url = self.base_url.join(path.as_str());

        let mut request = self.client.request(method, &url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            let err = transport_error(e);
            tracing::debug!(error = %err, "backend unreachable");
            err
        })?;

        let status = response.status();
        let raw_body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = backend_message(status, &raw_body);
            tracing::debug!(status = status.as_u16(), %message, "backend rejected request");
            return Err(ClientError::Backend {
                status_code: status.as_u16(),
                message,
                raw_body,
            });
        }

        if raw_body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&raw_body).map_err(|e| ClientError::decode(e, raw_body))
    }
}
