//! Request handlers for the translation endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

use super::ServerState;
use crate::error::VttError;

pub const MISSING_TEXT: &str = "No text provided. Please include \"text\" in the JSON payload.";
pub const MISSING_TEXTS: &str = "No texts provided. Please include \"texts\" in the JSON payload.";

/// Build all routes.
pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/translate", post(translate_one))
        .route("/translate_batch", post(translate_batch))
        .route("/health", get(health_check))
}

#[derive(Debug, Deserialize)]
pub struct TranslateOneRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TranslateBatchRequest {
    pub texts: Option<Vec<String>>,
}

async fn translate_one(
    State(state): State<ServerState>,
    payload: Result<Json<TranslateOneRequest>, JsonRejection>,
) -> Response {
    let text = match payload {
        Ok(Json(TranslateOneRequest { text: Some(text) })) => text,
        Ok(_) => return error_response(StatusCode::BAD_REQUEST, MISSING_TEXT),
        Err(rejection) => {
            debug!("Rejected translate body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, MISSING_TEXT);
        }
    };

    match state.translator.translate(&text).await {
        Ok(translation) => {
            info!("Translated: '{}' -> '{}'", text.trim(), translation.trim());
            Json(json!({ "translation": translation })).into_response()
        }
        Err(e) => translation_failed(e),
    }
}

async fn translate_batch(
    State(state): State<ServerState>,
    payload: Result<Json<TranslateBatchRequest>, JsonRejection>,
) -> Response {
    let texts = match payload {
        Ok(Json(TranslateBatchRequest { texts: Some(texts) })) => texts,
        Ok(_) => return error_response(StatusCode::BAD_REQUEST, MISSING_TEXTS),
        Err(rejection) => {
            debug!("Rejected translate_batch body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, MISSING_TEXTS);
        }
    };

    let start = std::time::Instant::now();
    let mut translations = Vec::with_capacity(texts.len());
    for text in &texts {
        match state.translator.translate(text).await {
            Ok(translation) => translations.push(translation),
            Err(e) => return translation_failed(e),
        }
    }
    info!("Translated batch of {} in {:.2} seconds", texts.len(), start.elapsed().as_secs_f64());

    Json(json!({ "translations": translations })).into_response()
}

/// Returns basic health status and version.
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn translation_failed(e: VttError) -> Response {
    let reason = match e {
        VttError::Translation(message) => message,
        other => other.to_string(),
    };
    error!("Translation failed: {}", reason);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &format!("Translation failed: {}", reason),
    )
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
