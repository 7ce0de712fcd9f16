use std::time::Duration;

use serde_json::Value;

use super::{Resource, decode_document, decode_list};
use crate::{
    domain::{ApiPath, Filter, Query},
    error::ClientError,
    models::{DagDetails, PipelineExecution},
};

const EXECUTIONS_PATH: &str = "/api/forgeiq/pipelines/executions";

/// Recent DAG executions, newest first. Live status, so short-lived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineExecutionsQuery {
    pub project_id: Filter,
    pub status: Filter,
    pub limit: u32,
}

impl PipelineExecutionsQuery {
    pub const DEFAULT_LIMIT: u32 = 25;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(mut self, project_id: impl Into<Filter>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn status(mut self, status: impl Into<Filter>) -> Self {
        self.status = status.into();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

impl Default for PipelineExecutionsQuery {
    fn default() -> Self {
        Self {
            project_id: Filter::All,
            status: Filter::All,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

impl Resource for PipelineExecutionsQuery {
    type Output = Vec<PipelineExecution>;

    const OPERATION: &'static str = "pipeline_executions";
    const TTL: Duration = Duration::from_secs(15);

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse(EXECUTIONS_PATH)?)
    }

    fn key(&self) -> Query {
        Query::new(Self::OPERATION)
            .with_filter("project_id", &self.project_id)
            .with_filter("status", &self.status)
            .with("limit", self.limit)
    }

    fn decode(payload: &Value) -> Result<Self::Output, ClientError> {
        decode_list(payload, "pipelines")
    }
}

/// Full state of one DAG: task statuses and structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagDetailsQuery {
    pub dag_id: String,
    pub project_id: Filter,
}

impl DagDetailsQuery {
    pub fn new(dag_id: impl Into<String>) -> Self {
        Self {
            dag_id: dag_id.into(),
            project_id: Filter::All,
        }
    }

    pub fn project(mut self, project_id: impl Into<Filter>) -> Self {
        self.project_id = project_id.into();
        self
    }
}

impl Resource for DagDetailsQuery {
    type Output = DagDetails;

    const OPERATION: &'static str = "dag_details";
    const TTL: Duration = Duration::from_secs(10);

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse(EXECUTIONS_PATH)?.child(&self.dag_id)?)
    }

    fn key(&self) -> Query {
        Query::new(Self::OPERATION)
            .with("dag_id", self.dag_id.as_str())
            .with_filter("project_id", &self.project_id)
    }

    // dag_id travels in the path
    fn params(&self) -> Vec<(String, String)> {
        self.project_id
            .value()
            .map(|p| vec![("project_id".to_string(), p.to_string())])
            .unwrap_or_default()
    }

    fn decode(payload: &Value) -> Result<Self::Output, ClientError> {
        decode_document(payload)
    }
}
