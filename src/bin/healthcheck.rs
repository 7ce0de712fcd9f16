use anyhow::{Result, bail};
use forgeiq_dashboard::{Dashboard, config, fetch::HealthQuery};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let settings = config::load()?;
    let dashboard = Dashboard::connect(&settings)?;

    let health = dashboard.fetch(&HealthQuery).await;
    if let Some(failure) = health.failure {
        bail!("{} unreachable: {}", settings.api_base_url, failure.message);
    }

    println!("{}: {}", settings.api_base_url, health.data.status);
    Ok(())
}
