use std::time::Duration;

use forgeiq_dashboard::{
    Dashboard,
    error::ErrorKind,
    fetch::{
        AgentsQuery, AuditLogsQuery, BuildConfigQuery, DagDetailsQuery, DeploymentsQuery,
        GovernanceAlertsQuery, PipelineExecutionsQuery, ProjectBuildConfigQuery, ProjectsQuery,
        SecurityScansQuery,
    },
    models::AgentRegistrySummary,
};
use serde_json::json;

mod common;
use common::mock_transport::{MockTransport, unreachable};

const EXECUTIONS: &str = "/api/forgeiq/pipelines/executions";

fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
    list.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn sentinel_filters_are_not_sent() {
    let backend = MockTransport::new();
    backend.respond("/api/forgeiq/deployments", json!({"deployments": []}));
    let dashboard = Dashboard::new(backend.clone());

    let query = DeploymentsQuery::new()
        .project("All")
        .service("")
        .environment("staging")
        .status(None::<&str>);
    let result = dashboard.fetch(&query).await;

    assert!(!result.is_failure());
    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].params,
        pairs(&[("limit", "25"), ("target_environment", "staging")])
    );
}

#[tokio::test]
async fn failed_pipelines_then_rerun() {
    let backend = MockTransport::new();
    backend.respond(
        EXECUTIONS,
        json!({"pipelines": [{"dag_id": "d1", "status": "FAILED"}]}),
    );
    backend.respond(
        "/api/forgeiq/pipelines/executions/d1/rerun",
        json!({"new_dag_id": "d2", "message": "rerun started"}),
    );
    let dashboard = Dashboard::new(backend.clone());
    let failed = PipelineExecutionsQuery::new().status("FAILED");

    let result = dashboard.fetch(&failed).await;
    assert!(!result.is_failure());
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].dag_id, "d1");
    assert!(result.data[0].can_rerun());
    assert_eq!(
        backend.calls()[0].params,
        pairs(&[("limit", "25"), ("status", "FAILED")])
    );

    // cached
    dashboard.fetch(&failed).await;
    assert_eq!(backend.call_count(EXECUTIONS), 1);

    let receipt = dashboard
        .invoke(&forgeiq_dashboard::actions::RerunDag::new("p1", "d1"))
        .await
        .unwrap();
    assert_eq!(receipt.new_dag_id.as_deref(), Some("d2"));

    dashboard.fetch(&failed).await;
    assert_eq!(backend.call_count(EXECUTIONS), 2);
}

#[tokio::test]
async fn unreachable_backend_yields_empty_data_and_failure() {
    let backend = MockTransport::new();
    backend.fail("/api/forgeiq/projects", unreachable());
    let dashboard = Dashboard::new(backend.clone());

    let result = dashboard.fetch(&ProjectsQuery).await;

    assert!(result.data.is_empty());
    let failure = result.failure.unwrap();
    assert_eq!(failure.kind, ErrorKind::Transport);
    assert!(failure.message.contains("Connection refused"));
    assert!(failure.message.chars().count() <= 100);
}

#[tokio::test]
async fn empty_list_is_not_a_failure() {
    let backend = MockTransport::new();
    backend.respond("/api/forgeiq/agents", json!({"agents": []}));
    let dashboard = Dashboard::new(backend.clone());

    let result = dashboard.fetch(&AgentsQuery).await;

    assert!(result.data.is_empty());
    assert!(!result.is_failure());
}

#[tokio::test]
async fn failed_fetch_is_retried_on_next_call() {
    let backend = MockTransport::new();
    backend.fail("/api/forgeiq/agents", unreachable());
    let dashboard = Dashboard::new(backend.clone());

    assert!(dashboard.fetch(&AgentsQuery).await.is_failure());

    backend.respond(
        "/api/forgeiq/agents",
        json!({"agents": [
            {"agent_id": "a1", "agent_type": "PlanAgent"},
            {"agent_id": "a2", "agent_type": "BuildAgent"},
            {"agent_id": "a3", "agent_type": "PlanAgent"},
        ]}),
    );
    let result = dashboard.fetch(&AgentsQuery).await;
    assert!(!result.is_failure());
    assert_eq!(backend.call_count("/api/forgeiq/agents"), 2);

    let summary = AgentRegistrySummary::from_agents(&result.data);
    assert_eq!(summary.total_registered, 3);
    assert_eq!(summary.types["PlanAgent"], 2);
}

#[tokio::test]
async fn malformed_envelope_is_a_decode_failure_and_not_cached() {
    let backend = MockTransport::new();
    backend.respond(
        "/api/forgeiq/governance/alerts",
        json!({"alerts": {"not": "a list"}}),
    );
    let dashboard = Dashboard::new(backend.clone());

    let result = dashboard.fetch(&GovernanceAlertsQuery::new()).await;
    assert!(result.data.is_empty());
    assert_eq!(result.failure.unwrap().kind, ErrorKind::Decode);

    dashboard.fetch(&GovernanceAlertsQuery::new()).await;
    assert_eq!(backend.call_count("/api/forgeiq/governance/alerts"), 2);
}

#[tokio::test]
async fn backend_errors_are_reported() {
    let backend = MockTransport::new();
    let dashboard = Dashboard::new(backend.clone());

    // no route scripted: the mock answers 404
    let result = dashboard.fetch(&SecurityScansQuery::new()).await;
    let failure = result.failure.unwrap();
    assert_eq!(failure.kind, ErrorKind::Backend);
    assert!(failure.message.contains("404"));
}

#[tokio::test]
async fn dag_details_and_audit_logs() {
    let backend = MockTransport::new();
    backend.respond(
        "/api/forgeiq/pipelines/executions/d1",
        json!({
            "dag_id": "d1",
            "status": "RUNNING",
            "task_statuses": [{"task_id": "lint", "status": "COMPLETED_SUCCESS"}],
            "nodes": [{"id": "lint"}, {"id": "test", "dependencies": ["lint"]}],
        }),
    );
    backend.respond(
        "/api/forgeiq/governance/audit-logs",
        json!({"audit_logs": [{"audit_id": "x1", "source_event_type": "DeploymentEvent"}]}),
    );
    let dashboard = Dashboard::new(backend.clone());

    let details = dashboard
        .fetch(&DagDetailsQuery::new("d1").project("p1"))
        .await;
    assert!(!details.is_failure());
    assert_eq!(details.data.task_statuses.len(), 1);
    assert_eq!(details.data.structure().len(), 2);
    assert_eq!(backend.calls()[0].params, pairs(&[("project_id", "p1")]));

    let logs = dashboard
        .fetch(&AuditLogsQuery::new().source_event_type("DeploymentEvent"))
        .await;
    assert_eq!(logs.data.len(), 1);
    assert_eq!(
        backend.calls()[1].params,
        pairs(&[("limit", "100"), ("source_event_type", "DeploymentEvent")])
    );
}

#[tokio::test]
async fn missing_singular_resource_is_an_empty_mapping() {
    let backend = MockTransport::new();
    backend.fail(
        "/api/forgeiq/config/build-system",
        forgeiq_dashboard::ClientError::Backend {
            status_code: 500,
            message: "Internal Server Error".to_string(),
            raw_body: String::new(),
        },
    );
    backend.respond(
        "/api/forgeiq/projects/p1/build-config",
        json!({"project_id": "p1", "configuration": {"max_parallel_tasks": 4}}),
    );
    let dashboard = Dashboard::new(backend.clone());

    let global = dashboard.fetch(&BuildConfigQuery).await;
    assert!(global.is_failure());
    assert!(global.data.is_empty());

    let project = dashboard.fetch(&ProjectBuildConfigQuery::new("p1")).await;
    assert!(!project.is_failure());
    assert_eq!(project.data["max_parallel_tasks"], 4);
}

#[tokio::test]
async fn leaving_a_page_abandons_its_fetches() {
    let backend = MockTransport::new();
    backend.respond("/api/forgeiq/projects", json!({"projects": [{"id": "p1"}]}));
    backend.set_delay(Duration::from_millis(200));
    let dashboard = Dashboard::new(backend.clone());
    let page = dashboard.page();

    let pending = {
        let page = page.clone();
        tokio::spawn(async move { page.fetch(&ProjectsQuery).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    page.cancel();

    let result = pending.await.unwrap();
    assert_eq!(result.failure.unwrap().kind, ErrorKind::Cancelled);
    assert!(!dashboard.is_cancelled());

    // the shared context is unaffected and fetches afresh
    backend.set_delay(Duration::ZERO);
    let result = dashboard.fetch(&ProjectsQuery).await;
    assert_eq!(result.data.len(), 1);
    assert_eq!(backend.call_count("/api/forgeiq/projects"), 2);
}

#[tokio::test]
async fn pages_share_one_cache() {
    let backend = MockTransport::new();
    backend.respond("/api/forgeiq/projects", json!({"projects": [{"id": "p1"}]}));
    let dashboard = Dashboard::new(backend.clone());

    let overview_page = dashboard.page();
    let projects_page = dashboard.page();
    overview_page.fetch(&ProjectsQuery).await;
    projects_page.fetch(&ProjectsQuery).await;

    assert_eq!(backend.total_calls(), 1);
}
