use std::time::Duration;

use anyhow::Result;
use forgeiq_dashboard::{
    Dashboard, config, overview,
    scheduler::Scheduler,
    tasks::{diag, refresh},
};

const DIAG_INTERVAL: Duration = Duration::from_secs(60);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let settings = config::load()?;
    let dashboard = Dashboard::connect(&settings)?;

    let Some(period) = settings.refresh_interval else {
        let overview = overview::load(&dashboard).await;
        println!("{overview:#?}");
        if overview.is_unavailable() {
            anyhow::bail!("backend at {} is unavailable", settings.api_base_url);
        }
        return Ok(());
    };

    let mut scheduler = Scheduler::new();
    scheduler.spawn_task(
        period,
        "refresh_overview",
        dashboard.clone(),
        refresh::refresh_overview,
    );
    scheduler.spawn_task(
        DIAG_INTERVAL,
        "cache_diagnostics",
        dashboard.cache().clone(),
        |cache, _| diag::log_cache_stats(cache),
    );

    tracing::info!(every = ?period, "watching, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    dashboard.cancel();
    scheduler.shutdown(SHUTDOWN_TIMEOUT).await;
    Ok(())
}
