use std::time::Duration;

use serde_json::Value;

use super::{Resource, decode_document};
use crate::{
    domain::{ApiPath, Query},
    error::ClientError,
    models::BuildConfig,
};

const CONFIG_TTL: Duration = Duration::from_secs(300);

/// Global build-system configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfigQuery;

impl Resource for BuildConfigQuery {
    type Output = BuildConfig;

    const OPERATION: &'static str = "build_config";
    const TTL: Duration = CONFIG_TTL;

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/forgeiq/config/build-system")?)
    }

    fn key(&self) -> Query {
        Query::new(Self::OPERATION)
    }

    fn decode(payload: &Value) -> Result<Self::Output, ClientError> {
        decode_document(payload)
    }
}

/// Build configuration of a single project, served under `configuration`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectBuildConfigQuery {
    pub project_id: String,
}

impl ProjectBuildConfigQuery {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }
}

impl Resource for ProjectBuildConfigQuery {
    type Output = BuildConfig;

    const OPERATION: &'static str = "project_build_config";
    const TTL: Duration = CONFIG_TTL;

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/forgeiq/projects")?
            .child(&self.project_id)?
            .child("build-config")?)
    }

    fn key(&self) -> Query {
        Query::new(Self::OPERATION).with("project_id", self.project_id.as_str())
    }

    fn params(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn decode(payload: &Value) -> Result<Self::Output, ClientError> {
        match payload.get("configuration") {
            Some(config) => decode_document(config),
            None => Ok(BuildConfig::default()),
        }
    }
}
