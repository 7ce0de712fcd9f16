use std::time::Duration;

use serde_json::Value;

use super::{Resource, decode_list};
use crate::{
    domain::{ApiPath, Query},
    error::ClientError,
    models::Project,
};

/// All registered projects. Rarely changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectsQuery;

impl Resource for ProjectsQuery {
    type Output = Vec<Project>;

    const OPERATION: &'static str = "projects";
    const TTL: Duration = Duration::from_secs(120);

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/forgeiq/projects")?)
    }

    fn key(&self) -> Query {
        Query::new(Self::OPERATION)
    }

    fn decode(payload: &Value) -> Result<Self::Output, ClientError> {
        decode_list(payload, "projects")
    }
}
