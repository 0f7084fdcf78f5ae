// src/serve/mod.rs

//! Serve mode: expose the latest image over HTTP.
//!
//! The handlers are stateless per request apart from snapshotting the shared
//! latest-image record; nothing here ever mutates it.

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::config::ServeConfig;
use crate::errors::Result;
use crate::state::SharedLatest;

pub mod convert;
pub mod handlers;

pub use convert::ConvertCache;

/// Shared read-only handles for the HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub latest: SharedLatest,
    pub cache: ConvertCache,
}

impl AppState {
    pub fn new(latest: SharedLatest) -> Self {
        Self {
            latest,
            cache: ConvertCache::new(),
        }
    }
}

/// Build the HTTP surface: index, image, status, download.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/image", get(handlers::image))
        .route("/status", get(handlers::status))
        .route("/download", get(handlers::download))
        .with_state(state)
}

/// Bind and run the server until the process is stopped.
pub async fn serve(cfg: &ServeConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| crate::errors::LastframeError::ConfigError(format!("binding {addr}: {e}")))?;

    info!("serving on http://{addr}");
    axum::serve(listener, router(state))
        .await
        .map_err(crate::errors::LastframeError::IoError)?;
    Ok(())
}
