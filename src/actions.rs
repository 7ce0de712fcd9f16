//! State-changing backend calls.
//!
//! Actions are never cached and never retried. After a success the dashboard
//! drops the cache entries named by [`Action::invalidations`].

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    cache::Invalidation,
    domain::{ApiPath, ParamValue},
    error::ClientError,
    fetch::{
        DagDetailsQuery, DeploymentsQuery, PipelineExecutionsQuery, ProjectsQuery, Resource,
        project_scoped,
    },
    transport::Method,
};

const SUBMIT_SOURCE: &str = "forgeiq-dashboard";
const DEFAULT_COMMIT: &str = "latest";

pub trait Action: Send + Sync {
    /// What the backend hands back on success.
    type Receipt: DeserializeOwned + Send;

    const NAME: &'static str;

    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> Result<ApiPath, ClientError>;

    /// Request body. Checked before anything is sent.
    fn body(&self) -> Result<Value, ClientError>;

    /// Cached reads this action makes stale. Everything, unless narrowed.
    fn invalidations(&self) -> Vec<Invalidation> {
        vec![Invalidation::All]
    }
}

/// Asks the orchestrator to plan and run a pipeline from a natural-language prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPipeline {
    pub project_id: String,
    pub user_prompt: String,
    pub commit_sha: Option<String>,
    pub request_id: Uuid,
}

impl SubmitPipeline {
    pub fn new(project_id: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            user_prompt: user_prompt.into(),
            commit_sha: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn at_commit(mut self, commit_sha: impl Into<String>) -> Self {
        self.commit_sha = Some(commit_sha.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineSubmission {
    pub request_id: Option<String>,
    pub dag_id: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

impl Action for SubmitPipeline {
    type Receipt = PipelineSubmission;

    const NAME: &'static str = "submit_pipeline";

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/forgeiq/projects")?
            .child(&self.project_id)?
            .child("pipelines")?)
    }

    fn body(&self) -> Result<Value, ClientError> {
        let prompt = self.user_prompt.trim();
        if prompt.is_empty() {
            return Err(ClientError::InvalidRequest(
                "pipeline prompt is empty".to_string(),
            ));
        }

        let commit_sha = self
            .commit_sha
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_COMMIT);

        Ok(json!({
            "user_prompt": prompt,
            "additional_context": {
                "source": SUBMIT_SOURCE,
                "commit_sha": commit_sha,
            },
            "request_id": self.request_id.to_string(),
        }))
    }

    fn invalidations(&self) -> Vec<Invalidation> {
        vec![
            Invalidation::operation(ProjectsQuery::OPERATION),
            project_scoped(PipelineExecutionsQuery::OPERATION, &self.project_id),
        ]
    }
}

/// Reruns an existing DAG. The backend starts a new execution with a new id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerunDag {
    pub project_id: String,
    pub dag_id: String,
}

impl RerunDag {
    pub fn new(project_id: impl Into<String>, dag_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dag_id: dag_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RerunReceipt {
    pub new_dag_id: Option<String>,
    pub message: Option<String>,
}

impl Action for RerunDag {
    type Receipt = RerunReceipt;

    const NAME: &'static str = "rerun_dag";

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/forgeiq/pipelines/executions")?
            .child(&self.dag_id)?
            .child("rerun")?)
    }

    fn body(&self) -> Result<Value, ClientError> {
        Ok(json!({ "project_id": self.project_id }))
    }

    fn invalidations(&self) -> Vec<Invalidation> {
        let dag_id = ParamValue::from(self.dag_id.as_str());
        vec![
            project_scoped(PipelineExecutionsQuery::OPERATION, &self.project_id),
            Invalidation::matching(move |query| {
                query.operation() == DagDetailsQuery::OPERATION
                    && query.param("dag_id") == Some(&dag_id)
            }),
        ]
    }
}

/// Rolls a service back to its previous successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRollback {
    pub project_id: String,
    pub service_name: String,
    pub current_deployment_id: Option<String>,
}

impl TriggerRollback {
    pub fn new(project_id: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            service_name: service_name.into(),
            current_deployment_id: None,
        }
    }

    pub fn from_deployment(mut self, deployment_id: impl Into<String>) -> Self {
        self.current_deployment_id = Some(deployment_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RollbackReceipt {
    pub request_id: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

impl Action for TriggerRollback {
    type Receipt = RollbackReceipt;

    const NAME: &'static str = "trigger_rollback";

    fn path(&self) -> Result<ApiPath, ClientError> {
        Ok(ApiPath::parse("/api/forgeiq/deployments/rollback")?)
    }

    fn body(&self) -> Result<Value, ClientError> {
        if self.project_id.trim().is_empty() || self.service_name.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "rollback needs a project and a service".to_string(),
            ));
        }

        Ok(json!({
            "project_id": self.project_id,
            "service_name": self.service_name,
            "rollback_target_type": "previous_successful",
            "current_deployment_id_for_context": self.current_deployment_id,
        }))
    }

    fn invalidations(&self) -> Vec<Invalidation> {
        vec![project_scoped(
            DeploymentsQuery::OPERATION,
            &self.project_id,
        )]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domain::Query;

    #[test]
    fn submit_body() {
        let action = SubmitPipeline::new("p1", "  build and test  ");
        let body = action.body().unwrap();
        assert_eq!(body["user_prompt"], "build and test");
        assert_eq!(body["additional_context"]["commit_sha"], "latest");
        assert_eq!(body["additional_context"]["source"], SUBMIT_SOURCE);
        assert_eq!(body["request_id"], action.request_id.to_string());

        let pinned = SubmitPipeline::new("p1", "deploy").at_commit("abc123");
        assert_eq!(pinned.body().unwrap()["additional_context"]["commit_sha"], "abc123");

        assert_ne!(
            SubmitPipeline::new("p1", "x").request_id,
            SubmitPipeline::new("p1", "x").request_id
        );
    }

    #[test]
    fn empty_prompt_is_rejected() {
        let err = SubmitPipeline::new("p1", "   ").body().unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[test]
    fn paths() {
        assert_eq!(
            SubmitPipeline::new("p1", "x").path().unwrap().as_str(),
            "/api/forgeiq/projects/p1/pipelines"
        );
        assert_eq!(
            RerunDag::new("p1", "d1").path().unwrap().as_str(),
            "/api/forgeiq/pipelines/executions/d1/rerun"
        );
        assert!(RerunDag::new("p1", "d1/../x").path().is_err());
        assert_eq!(
            TriggerRollback::new("p1", "api").path().unwrap().as_str(),
            "/api/forgeiq/deployments/rollback"
        );
    }

    #[test]
    fn rollback_body() {
        let body = TriggerRollback::new("p1", "api")
            .from_deployment("dep-7")
            .body()
            .unwrap();
        assert_eq!(body["rollback_target_type"], "previous_successful");
        assert_eq!(body["current_deployment_id_for_context"], "dep-7");

        let body = TriggerRollback::new("p1", "api").body().unwrap();
        assert!(body["current_deployment_id_for_context"].is_null());

        assert!(TriggerRollback::new("p1", " ").body().is_err());
    }

    #[test]
    fn rerun_invalidates_executions_and_its_dag() {
        let invalidations = RerunDag::new("p1", "d1").invalidations();
        let hit = |q: &Query| invalidations.iter().any(|inv| inv.matches(q));

        assert!(hit(&PipelineExecutionsQuery::new().status("FAILED").key()));
        assert!(hit(&PipelineExecutionsQuery::new().project("p1").key()));
        assert!(!hit(&PipelineExecutionsQuery::new().project("p2").key()));
        assert!(hit(&DagDetailsQuery::new("d1").key()));
        assert!(hit(&DagDetailsQuery::new("d1").project("p1").key()));
        assert!(!hit(&DagDetailsQuery::new("d2").key()));
        assert!(!hit(&ProjectsQuery.key()));
    }

    #[test]
    fn submit_and_rollback_invalidations() {
        let submit = SubmitPipeline::new("p1", "x").invalidations();
        let hit = |q: &Query| submit.iter().any(|inv| inv.matches(q));
        assert!(hit(&ProjectsQuery.key()));
        assert!(hit(&PipelineExecutionsQuery::new().key()));
        assert!(!hit(&DeploymentsQuery::new().key()));

        let rollback = TriggerRollback::new("p1", "api").invalidations();
        let hit = |q: &Query| rollback.iter().any(|inv| inv.matches(q));
        assert!(hit(&DeploymentsQuery::new().key()));
        assert!(hit(&DeploymentsQuery::new().project("p1").key()));
        assert!(!hit(&DeploymentsQuery::new().project("p2").key()));
        assert!(!hit(&PipelineExecutionsQuery::new().key()));
    }
}
