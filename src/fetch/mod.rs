//! Read-only view-model fetchers.
//!
//! A fetcher is a [`Resource`]: a value describing one backend read, whose
//! identity ([`Resource::key`]) doubles as the cache key. Running it through
//! [`crate::dashboard::Dashboard::fetch`] never fails; failures come back as
//! default data plus a [`FetchFailure`].

mod agents;
mod build_config;
mod deployments;
mod governance;
mod health;
mod pipelines;
mod projects;
mod security;

use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

pub use agents::AgentsQuery;
pub use build_config::{BuildConfigQuery, ProjectBuildConfigQuery};
pub use deployments::DeploymentsQuery;
pub use governance::{AuditLogsQuery, GovernanceAlertsQuery};
pub use health::HealthQuery;
pub use pipelines::{DagDetailsQuery, PipelineExecutionsQuery};
pub use projects::ProjectsQuery;
pub use security::SecurityScansQuery;

use crate::{
    cache::Invalidation,
    domain::{ApiPath, ParamValue, Query},
    error::{ClientError, ErrorKind},
};

/// One cacheable backend read.
pub trait Resource: Send + Sync {
    type Output: DeserializeOwned + Serialize + Default + Send;

    /// Operation name, the first half of the cache key.
    const OPERATION: &'static str;
    const TTL: Duration;

    fn path(&self) -> Result<ApiPath, ClientError>;

    /// Everything that identifies this read, including ids bound into the path.
    fn key(&self) -> Query;

    /// Query-string parameters sent to the backend.
    fn params(&self) -> Vec<(String, String)> {
        self.key().to_pairs()
    }

    /// Extracts the typed view model from the raw response.
    fn decode(payload: &Value) -> Result<Self::Output, ClientError>;
}

/// Why a fetch came back with default data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: ErrorKind,
    /// Already truncated for display.
    pub message: String,
}

impl From<&ClientError> for FetchFailure {
    fn from(error: &ClientError) -> Self {
        Self {
            kind: error.kind(),
            message: error.display_message(),
        }
    }
}

/// Data to render plus the failure that replaced it with a default, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult<T> {
    pub data: T,
    pub failure: Option<FetchFailure>,
}

impl<T> FetchResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            failure: None,
        }
    }

    pub fn failed(error: &ClientError) -> Self
    where
        T: Default,
    {
        Self {
            data: T::default(),
            failure: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.message.as_str())
    }

    pub fn into_result(self) -> Result<T, FetchFailure> {
        match self.failure {
            None => Ok(self.data),
            Some(failure) => Err(failure),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchResult<U> {
        FetchResult {
            data: f(self.data),
            failure: self.failure,
        }
    }
}

/// Reads the list under `key`. A missing key or a null payload is an empty list.
pub(crate) fn decode_list<T: DeserializeOwned>(
    payload: &Value,
    key: &str,
) -> Result<Vec<T>, ClientError> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list @ Value::Array(_)) => {
            serde_json::from_value(list.clone()).map_err(|e| ClientError::decode(e, payload.to_string()))
        }
        Some(_) => Err(ClientError::decode(
            format!("`{key}` is not a list"),
            payload.to_string(),
        )),
    }
}

/// Reads a whole-document resource. A null payload is the default value.
pub(crate) fn decode_document<T: DeserializeOwned + Default>(
    payload: &Value,
) -> Result<T, ClientError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload.clone()).map_err(|e| ClientError::decode(e, payload.to_string()))
}

/// Drops cached reads of `operation` that could contain `project_id`'s data:
/// those filtered on that project and the unfiltered ones.
pub fn project_scoped(operation: &'static str, project_id: &str) -> Invalidation {
    let project_id = ParamValue::from(project_id);
    Invalidation::matching(move |query: &Query| {
        query.operation() == operation
            && query
                .param("project_id")
                .is_none_or(|p| *p == project_id)
    })
}
