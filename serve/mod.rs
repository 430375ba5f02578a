//! HTTP front for the [`PredictionService`].
//!
//! ```text
//! POST /predict  ──►  handlers::predict  ──►  PredictionService::predict
//!                         │                        │
//!                         ▼                        ▼
//!                 400 {"detail": ...}      200 {"prediction": ...}
//! ```
//!
//! The artifact store is loaded before this module is ever reached, so a server that is
//! listening always has a usable model.

use log::{error, info};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::service::PredictionService;

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to bind or serve on {addr}: {source}")]
    Io {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn run(config: &ServerConfig, service: PredictionService) -> Result<(), ServeError> {
    let cors = config.cors_layer()?;
    let app = create_router(AppState::new(service), cors);

    let addr = config.bind;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Io { addr, source })?;
    info!("Listening on http://{addr}");
    info!("Allowed origins: {}", config.allowed_origins.join(", "));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| ServeError::Io { addr, source })?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, draining connections"),
        Err(err) => {
            error!("Could not install Ctrl-C handler: {err}");
            std::future::pending::<()>().await;
        }
    }
}
