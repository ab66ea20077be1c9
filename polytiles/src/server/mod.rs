//! HTTP API.
//!
//! - `POST /api/convert/polygons` runs the conversion pipeline and streams
//!   progress as newline-delimited JSON
//! - `GET /api/health` reports liveness and version

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::{CONVERT_POLYGONS_PATH, HEALTH_PATH};
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Errors from running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    routes::routes().with_state(Arc::new(state))
}

/// Binds `listen` and serves until `shutdown` is cancelled.
pub async fn serve(
    listen: &str,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let addr: SocketAddr = listen.parse().map_err(|source| ServerError::InvalidAddress {
        addr: listen.to_string(),
        source,
    })?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    serve_listener(listener, state, shutdown).await
}

/// Serves on an already bound listener until `shutdown` is cancelled.
///
/// In-flight conversions keep streaming until they finish.
pub async fn serve_listener(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    info!(addr = %listener.local_addr()?, "Polytiles server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Server stopped");
    Ok(())
}
