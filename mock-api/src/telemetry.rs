use tracing::Subscriber;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Log an error with its full chain.
pub fn log_error(e: impl Into<anyhow::Error>) {
    let e: anyhow::Error = e.into();
    tracing::error!("{e:#}");
}

/// A compact stderr subscriber. `RUST_LOG` wins over `default_filter`.
pub fn get_subscriber(
    default_filter: &str,
) -> impl Subscriber + Sync + Send + 'static {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let stderr = fmt::Layer::new()
        .with_writer(std::io::stderr)
        .compact()
        .with_target(true)
        .with_span_events(fmt::format::FmtSpan::CLOSE);
    Registry::default().with(env_filter).with(stderr)
}

/// Install `subscriber` (and the `log` bridge) as the global default unless
/// one is already set.
///
/// Safe to call from every test; only the first call takes effect.
pub fn init_subscriber(
    subscriber: impl Subscriber + Sync + Send + 'static,
) -> bool {
    subscriber.try_init().is_ok()
}
