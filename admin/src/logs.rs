//! Logging to stderr, correlated by a per-process session id.

use payloads::Storage;
use payloads::storage::SESSION_ID_KEY;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use uuid::Uuid;

/// Initialize logging. `RUST_LOG` takes precedence over `default_filter`.
pub fn init_logging(default_filter: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    LogTracer::init()?;
    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// The session id for this process, created on first use.
pub fn session_id(session_storage: &dyn Storage) -> String {
    match session_storage.get(SESSION_ID_KEY) {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            session_storage.set(SESSION_ID_KEY, &id);
            id
        }
    }
}

/// Root span carrying the session id; enter it for the life of the
/// process.
pub fn session_span(session_storage: &dyn Storage) -> tracing::Span {
    tracing::info_span!("session", session_id = %session_id(session_storage))
}
