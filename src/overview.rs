use time::OffsetDateTime;

use crate::{
    dashboard::Dashboard,
    fetch::{
        AgentsQuery, DeploymentsQuery, FetchFailure, GovernanceAlertsQuery, HealthQuery,
        PipelineExecutionsQuery, ProjectsQuery,
    },
};

const UNKNOWN_HEALTH: &str = "unknown";
const SECTION_COUNT: usize = 6;

/// Headline numbers of the landing page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overview {
    pub health: String,
    pub active_projects: usize,
    pub agents_online: usize,
    pub agents_total: usize,
    pub running_pipelines: usize,
    pub failed_pipelines: usize,
    pub successful_deployments: usize,
    pub critical_alerts: usize,
    /// Sections that could not be loaded; their counts are zero.
    pub failed_sections: Vec<(&'static str, FetchFailure)>,
}

impl Overview {
    pub fn is_degraded(&self) -> bool {
        !self.failed_sections.is_empty()
    }

    /// Nothing could be loaded, most likely the backend is down.
    pub fn is_unavailable(&self) -> bool {
        self.failed_sections.len() == SECTION_COUNT
    }
}

/// Loads every section concurrently. One failing section does not hide the others.
#[tracing::instrument(name = "overview::load", skip_all)]
pub async fn load(dashboard: &Dashboard) -> Overview {
    let pipelines_query = PipelineExecutionsQuery::new();
    let deployments_query = DeploymentsQuery::new();
    let alerts_query = GovernanceAlertsQuery::new();

    let (health, projects, pipelines, deployments, agents, alerts) = tokio::join!(
        dashboard.fetch(&HealthQuery),
        dashboard.fetch(&ProjectsQuery),
        dashboard.fetch(&pipelines_query),
        dashboard.fetch(&deployments_query),
        dashboard.fetch(&AgentsQuery),
        dashboard.fetch(&alerts_query),
    );

    let now = OffsetDateTime::now_utc();
    let mut failed_sections = Vec::new();
    let mut note = |section: &'static str, failure: &Option<FetchFailure>| {
        if let Some(failure) = failure {
            failed_sections.push((section, failure.clone()));
        }
    };
    note("health", &health.failure);
    note("projects", &projects.failure);
    note("pipelines", &pipelines.failure);
    note("deployments", &deployments.failure);
    note("agents", &agents.failure);
    note("alerts", &alerts.failure);

    let health = if health.is_failure() || health.data.status.is_empty() {
        UNKNOWN_HEALTH.to_string()
    } else {
        health.data.status
    };

    let overview = Overview {
        health,
        active_projects: projects.data.iter().filter(|p| p.is_active()).count(),
        agents_online: agents.data.iter().filter(|a| a.is_online(now)).count(),
        agents_total: agents.data.len(),
        running_pipelines: pipelines.data.iter().filter(|p| p.is_running()).count(),
        failed_pipelines: pipelines.data.iter().filter(|p| p.is_failed()).count(),
        successful_deployments: deployments.data.iter().filter(|d| d.is_successful()).count(),
        critical_alerts: alerts.data.iter().filter(|a| a.is_critical()).count(),
        failed_sections,
    };

    if overview.is_degraded() {
        tracing::warn!(
            failed = overview.failed_sections.len(),
            "overview loaded with missing sections"
        );
    }
    overview
}
