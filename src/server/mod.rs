//! HTTP endpoint exposing the configured translator.
//!
//! Pass-through only: validates the request body, calls the translator,
//! and maps failures to JSON error responses.

pub mod handlers;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, VttError};
use crate::translate::Translator;

/// Shared state accessible by all handlers.
#[derive(Clone)]
pub struct ServerState {
    pub translator: Arc<dyn Translator>,
}

/// Build the router with all routes.
pub fn build_router(translator: Arc<dyn Translator>, cors_origins: &[String]) -> Router {
    let cors = if cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    handlers::routes()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ServerState { translator })
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, translator: Arc<dyn Translator>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|e| VttError::Server(format!("cannot bind {}:{}: {}", config.host, config.port, e)))?;
    info!("Translation server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(translator, &config.cors_origins))
        .await
        .map_err(|e| VttError::Server(e.to_string()))
}
