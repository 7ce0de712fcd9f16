use std::time::Duration;

use forgeiq_dashboard::{Dashboard, error::ErrorKind, overview};
use serde_json::json;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

mod common;
use common::mock_transport::{MockTransport, unreachable};

fn seconds_ago(secs: i64) -> String {
    (OffsetDateTime::now_utc() - time::Duration::seconds(secs))
        .format(&Rfc3339)
        .unwrap()
}

#[tokio::test]
async fn counts_every_section() {
    let backend = MockTransport::new();
    backend.respond("/api/health", json!({"status": "ok", "redis": "connected"}));
    backend.respond(
        "/api/forgeiq/projects",
        json!({"projects": [
            {"id": "p1", "status": "active"},
            {"id": "p2", "status": "archived"},
            {"id": "p3"},
        ]}),
    );
    backend.respond(
        "/api/forgeiq/pipelines/executions",
        json!({"pipelines": [
            {"dag_id": "d1", "status": "RUNNING"},
            {"dag_id": "d2", "status": "FAILED"},
            {"dag_id": "d3", "status": "FAILED"},
            {"dag_id": "d4", "status": "COMPLETED_SUCCESS"},
        ]}),
    );
    backend.respond(
        "/api/forgeiq/deployments",
        json!({"deployments": [
            {"deployment_id": "x1", "status": "SUCCESSFUL"},
            {"deployment_id": "x2", "status": "FAILED"},
        ]}),
    );
    backend.respond(
        "/api/forgeiq/agents",
        json!({"agents": [
            {"agent_id": "a1", "status": "ACTIVE", "last_seen_timestamp": seconds_ago(10)},
            {"agent_id": "a2", "status": "ACTIVE", "last_seen_timestamp": seconds_ago(3600)},
            {"agent_id": "a3", "status": "offline"},
        ]}),
    );
    backend.respond(
        "/api/forgeiq/governance/alerts",
        json!({"alerts": [
            {"alert_type": "PolicyBreach", "severity": "CRITICAL"},
            {"event_type": "SLAViolation", "severity": "LOW"},
        ]}),
    );
    backend.set_delay(Duration::from_millis(50));
    let dashboard = Dashboard::new(backend.clone());

    let started = std::time::Instant::now();
    let overview = overview::load(&dashboard).await;
    // sections load concurrently, not one after another
    assert!(started.elapsed() < Duration::from_millis(250));

    assert_eq!(overview.health, "ok");
    assert_eq!(overview.active_projects, 2);
    assert_eq!(overview.running_pipelines, 1);
    assert_eq!(overview.failed_pipelines, 2);
    assert_eq!(overview.successful_deployments, 1);
    assert_eq!(overview.agents_total, 3);
    assert_eq!(overview.agents_online, 1);
    assert_eq!(overview.critical_alerts, 1);
    assert!(!overview.is_degraded());
    assert_eq!(backend.total_calls(), 6);
}

#[tokio::test]
async fn failing_section_does_not_hide_the_rest() {
    let backend = MockTransport::new();
    backend.respond("/api/health", json!({"status": "degraded"}));
    backend.respond("/api/forgeiq/projects", json!({"projects": [{"id": "p1"}]}));
    backend.fail("/api/forgeiq/agents", unreachable());
    let dashboard = Dashboard::new(backend.clone());

    let overview = overview::load(&dashboard).await;

    assert_eq!(overview.health, "degraded");
    assert_eq!(overview.active_projects, 1);
    assert_eq!(overview.agents_total, 0);
    assert!(overview.is_degraded());
    assert!(!overview.is_unavailable());

    let failed: Vec<_> = overview.failed_sections.iter().map(|(s, _)| *s).collect();
    // pipelines, deployments and alerts have no scripted route
    assert_eq!(failed, vec!["pipelines", "deployments", "agents", "alerts"]);
    let (_, agents) = &overview.failed_sections[2];
    assert_eq!(agents.kind, ErrorKind::Transport);
}

#[tokio::test]
async fn backend_down_is_unavailable() {
    let backend = MockTransport::new();
    for path in [
        "/api/health",
        "/api/forgeiq/projects",
        "/api/forgeiq/pipelines/executions",
        "/api/forgeiq/deployments",
        "/api/forgeiq/agents",
        "/api/forgeiq/governance/alerts",
    ] {
        backend.fail(path, unreachable());
    }
    let dashboard = Dashboard::new(backend.clone());

    let overview = overview::load(&dashboard).await;

    assert!(overview.is_unavailable());
    assert_eq!(overview.health, "unknown");
}
