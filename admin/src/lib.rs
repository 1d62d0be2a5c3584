//! Administration client for the AyniLine backend: session handling,
//! paginated listings and one service per backend module.

use payloads::{APIClient, Storage};
use std::sync::Arc;

pub mod cli;
pub mod components;
pub mod config;
pub mod error;
pub mod hooks;
pub mod logs;
pub mod models;
pub mod pages;
pub mod routes;
pub mod services;
pub mod state;

pub use config::AdminConfig;
pub use error::AdminError;
pub use routes::Route;
pub use state::SessionStore;

/// An API client configured from `config`, keeping its token in
/// `storage`.
pub fn build_client(
    config: &AdminConfig,
    storage: Arc<dyn Storage>,
) -> APIClient {
    APIClient::new(config.api_url.clone(), storage)
        .with_retry_policy(config.retry_policy())
        .with_timeout(config.timeout)
}
