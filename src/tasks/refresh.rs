use anyhow::{Result, bail};
use tokio_util::sync::CancellationToken;

use crate::{dashboard::Dashboard, overview};

/// Reloads the overview on its own page scope and logs the headline numbers.
///
/// Shutdown cancels the scope, abandoning fetches still in flight.
pub async fn refresh_overview(dashboard: Dashboard, cancel: CancellationToken) -> Result<()> {
    let page = dashboard.page();
    let overview = tokio::select! {
        overview = overview::load(&page) => overview,
        _ = cancel.cancelled() => {
            page.cancel();
            return Ok(());
        }
    };

    tracing::info!(
        health = %overview.health,
        active_projects = overview.active_projects,
        agents_online = overview.agents_online,
        agents_total = overview.agents_total,
        running_pipelines = overview.running_pipelines,
        failed_pipelines = overview.failed_pipelines,
        successful_deployments = overview.successful_deployments,
        critical_alerts = overview.critical_alerts,
        "overview refreshed"
    );

    for (section, failure) in &overview.failed_sections {
        tracing::warn!(section, kind = ?failure.kind, "{}", failure.message);
    }

    if overview.is_unavailable() {
        bail!("every overview section failed");
    }
    Ok(())
}
