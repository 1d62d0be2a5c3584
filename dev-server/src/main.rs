//! Development backend for the admin CLI
//!
//! Runs the mock backend persistently, populated with the development
//! dataset, so `ayniline-admin` can be pointed at it.
//!
//! Usage: cargo run -p dev-server
//! Then:  AYNILINE_API_URL=http://127.0.0.1:3000 cargo run -p admin -- login

use anyhow::Result;
use test_helpers::mock::DevDataset;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let subscriber = mock_api::telemetry::get_subscriber("info");
    mock_api::telemetry::init_subscriber(subscriber);

    let config = mock_api::Config::from_env()?;
    info!("Starting AyniLine development backend");
    let app = test_helpers::spawn_app_on_port(config.port).await?;
    info!("Backend running on {}", app.address);

    let dataset = match DevDataset::create(&app).await {
        Ok(dataset) => dataset,
        Err(e) => {
            mock_api::telemetry::log_error(e);
            anyhow::bail!("Could not seed the development dataset");
        }
    };
    app.store.clear_requests();
    dataset.print_summary();
    info!("Press Ctrl+C to shutdown");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down development backend");
    Ok(())
}
