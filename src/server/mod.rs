//! # HTTP Compile Service
//!
//! Exposes the compilers over HTTP so an editor front end or a print
//! gateway can turn saved documents into printer templates.
//!
//! ## Usage
//!
//! ```bash
//! rprint-layout serve --listen 0.0.0.0:8080
//! ```
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /api/compile` | document JSON → compile output (lenient) |
//! | `POST /api/validate` | strict load, `{valid, kind, elements}` |
//! | `GET /api/kinds/:kind/types` | element types of a canvas kind |
//! | `GET /health` | liveness |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{LayoutError, Result};

/// Largest accepted request body.
pub const MAX_DOCUMENT_BYTES: usize = 2 * 1024 * 1024;

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/compile", post(handlers::compile::compile))
        .route("/api/validate", post(handlers::compile::validate))
        .route("/api/kinds/:kind/types", get(handlers::kinds::element_types))
        .layer(DefaultBodyLimit::max(MAX_DOCUMENT_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use rprint_layout::server::{serve, ServerConfig};
///
/// # async fn example() -> rprint_layout::error::Result<()> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| LayoutError::Server(format!("Failed to bind to {}: {}", config.listen_addr, e)))?;
    info!(listen = %config.listen_addr, "compile service listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| LayoutError::Server(e.to_string()))?;

    Ok(())
}
