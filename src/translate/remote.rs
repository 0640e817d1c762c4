use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, VttError};
use super::Translator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Client of a `/translate` endpoint (the contract served by `vttstitch serve`)
pub struct RemoteTranslator {
    client: Client,
    url: String,
}

impl RemoteTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/translate", config.endpoint.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Translator for RemoteTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        debug!("Sending translation request to: {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&TranslateRequest { text: text.to_string() })
            .send()
            .await
            .map_err(|e| VttError::Translation(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(VttError::Translation(format!(
                "Translation service error {}: {}",
                status, message
            )));
        }

        let result: TranslateResponse = response
            .json()
            .await
            .map_err(|e| VttError::Translation(format!("Failed to parse response: {}", e)))?;

        Ok(result.translation)
    }
}
