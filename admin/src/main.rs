use admin::cli::{self, Cli};
use admin::{AdminConfig, logs};
use clap::Parser;
use payloads::{FileStorage, MemoryStorage, Storage};
use std::sync::Arc;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AdminConfig::from_env()?;
    cli.apply_overrides(&mut config);
    logs::init_logging(&config.log_filter)?;

    let storage: Arc<dyn Storage> =
        Arc::new(FileStorage::open(config.storage_path.clone()));
    let session_storage = MemoryStorage::new();
    let span = logs::session_span(&session_storage);
    cli::run(cli.command, &config, storage).instrument(span).await
}
