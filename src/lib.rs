pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

use std::io;

use actix_web::web;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::AppConfig;

/// Loads configuration, builds the state and serves until shutdown.
pub async fn run() -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = AppConfig::load().map_err(|err| {
        error!(error = %err, "Failed to load configuration");
        io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
    })?;
    let host = config.host.clone();
    let port = config.port;

    let state = infrastructure::bootstrap::setup(config).map_err(|err| {
        error!(error = %err, "Failed to initialize application state");
        io::Error::new(io::ErrorKind::Other, err.to_string())
    })?;

    interfaces::http::start_server(web::Data::new(state), &host, port)?.await
}
