use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{
    actions::Action,
    cache::{Invalidation, QueryCache},
    config::{ConfigError, Settings},
    error::ClientError,
    fetch::{FetchResult, Resource},
    transport::{HttpTransport, Method, Transport},
};

/// Client context shared by every page: one transport, one cache.
///
/// Each page works on a [`Dashboard::page`] scope so that leaving the page
/// abandons its in-flight fetches without touching the others.
#[derive(Clone)]
pub struct Dashboard {
    transport: Arc<dyn Transport>,
    cache: QueryCache,
    cancel: CancellationToken,
}

impl Dashboard {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_cache(transport, QueryCache::default())
    }

    pub fn with_cache(transport: Arc<dyn Transport>, cache: QueryCache) -> Self {
        Self {
            transport,
            cache,
            cancel: CancellationToken::new(),
        }
    }

    /// Builds the HTTP transport from resolved settings.
    pub fn connect(settings: &Settings) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(settings)?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// A child scope sharing transport and cache, cancelled with its parent or on its own.
    pub fn page(&self) -> Dashboard {
        Self {
            transport: self.transport.clone(),
            cache: self.cache.clone(),
            cancel: self.cancel.child_token(),
        }
    }

    /// Abandons every fetch started from this scope and its children.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Manual refresh: drops the selected cache entries.
    pub fn refresh(&self, invalidation: &Invalidation) {
        self.cache.invalidate(invalidation);
    }

    /// Runs a read through the cache. Never fails: a failure yields default data and a failure flag.
    #[tracing::instrument(name = "dashboard::fetch", skip_all, fields(operation = R::OPERATION))]
    pub async fn fetch<R: Resource>(&self, resource: &R) -> FetchResult<R::Output> {
        match self.try_fetch(resource).await {
            Ok(data) => FetchResult::success(data),
            Err(ClientError::Cancelled) => {
                tracing::debug!("fetch abandoned");
                FetchResult::failed(&ClientError::Cancelled)
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed, showing empty data");
                FetchResult::failed(&e)
            }
        }
    }

    async fn try_fetch<R: Resource>(&self, resource: &R) -> Result<R::Output, ClientError> {
        let path = &resource.path()?;
        let params = resource.params();
        let params = params.as_slice();
        let transport = &self.transport;

        let cached = self
            .cache
            .get_or_fetch_until(&resource.key(), R::TTL, &self.cancel, || async move {
                let raw = transport.request(Method::GET, path, params, None).await?;
                // only payloads that decode are worth caching
                let output = R::decode(&raw)?;
                serde_json::to_value(&output).map_err(|e| ClientError::decode(e, raw.to_string()))
            })
            .await?;

        serde_json::from_value(Value::clone(&cached))
            .map_err(|e| ClientError::decode(e, cached.to_string()))
    }

    /// Performs a state-changing call. Uncached and never retried.
    /// On success the action's stale reads are dropped from the cache.
    #[tracing::instrument(name = "dashboard::invoke", skip_all, fields(action = A::NAME))]
    pub async fn invoke<A: Action>(&self, action: &A) -> Result<A::Receipt, ClientError> {
        let result = self.try_invoke(action).await;
        match &result {
            Ok(_) => {
                for invalidation in action.invalidations() {
                    self.cache.invalidate(&invalidation);
                }
                tracing::info!("action succeeded");
            }
            Err(e) => tracing::error!(error = %e, "action failed"),
        }
        result
    }

    async fn try_invoke<A: Action>(&self, action: &A) -> Result<A::Receipt, ClientError> {
        let path = action.path()?;
        let body = action.body()?;

        let raw = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
            raw = self.transport.request(action.method(), &path, &[], Some(&body)) => raw?,
        };

        // 204 and empty bodies carry no receipt fields
        let raw = if raw.is_null() {
            Value::Object(Default::default())
        } else {
            raw
        };
        serde_json::from_value(raw.clone()).map_err(|e| ClientError::decode(e, raw.to_string()))
    }
}
