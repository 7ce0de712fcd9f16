use std::time::Duration;

use serde_json::Value;

use super::{Resource, decode_list};
use crate::{
    domain::{ApiPath, Filter, Query},
    error::ClientError,
    models::Deployment,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentsQuery {
    pub project_id: Filter,
    pub service_name: Filter,
    pub target_environment: Filter,
    pub status: Filter,
    pub limit: u32,
}

impl DeploymentsQuery {
    pub const DEFAULT_LIMIT: u32 = 25;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(mut self, project_id: impl Into<Filter>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn service(mut self, service_name: impl Into<Filter>) -> Self {
        self.service_name = service_name.into();
        self
    }

    pub fn environment(mut self, target_environment: impl Into<Filter>) -> Self {
        self.target_environment = target_environment.into();
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

impl Default for DeploymentsQuery {
    fn default() -> Self {
        Self {
            project_id: Filter::All,
            service_name: Filter::All,
            target_environment: Filter::All,
            status: Filter::All,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

impl Resource for DeploymentsQuery {
    type Output = Vec<Deployment>;

    const OPERATION: &'static str = "deployments";
    const TTL: Duration = Duration::from_secs(30);

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/forgeiq/deployments")?)
    }

    fn key(&self) -> Query {
        Query::new(Self::OPERATION)
            .with_filter("project_id", &self.project_id)
            .with_filter("service_name", &self.service_name)
            .with_filter("target_environment", &self.target_environment)
            .with_filter("status", &self.status)
            .with("limit", self.limit)
    }

    fn decode(payload: &Value) -> Result<Self::Output, ClientError> {
        decode_list(payload, "deployments")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_selected_filters_are_sent() {
        let query = DeploymentsQuery::new()
            .project("p1")
            .service("")
            .environment(None::<&str>)
            .status("SUCCESSFUL")
            .limit(10);
        assert_eq!(
            query.params(),
            vec![
                ("limit".to_string(), "10".to_string()),
                ("project_id".to_string(), "p1".to_string()),
                ("status".to_string(), "SUCCESSFUL".to_string()),
            ]
        );
    }
}
