use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::error::{Result, VttError};
use super::Translator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Translates one line at a time by prompting an Ollama model
pub struct OllamaTranslator {
    client: Client,
    config: TranslateConfig,
}

impl OllamaTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Build the translation prompt, asking for JSON output
    fn build_translation_prompt(&self, text: &str) -> String {
        let source_name = language_code_to_name(&self.config.source_language);
        let target_name = language_code_to_name(&self.config.target_language);

        format!(
            "You are a professional subtitle translator.\n\
             \n\
             Translate the subtitle line from {} to {} ONLY.\n\
             Keep it on a single line. Do not add explanations or alternatives.\n\
             \n\
             Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
             \n\
             Text to translate: \"{}\"\n",
            source_name, target_name, target_name, text
        )
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: self.build_translation_prompt(text),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| VttError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VttError::Translation(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| VttError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw_response = generated.response.trim();
        debug!("Raw Ollama response: {}", raw_response);

        if raw_response.is_empty() {
            return Err(VttError::Translation("Empty translation received".to_string()));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(raw_response) {
            return Ok(result.text.trim().to_string());
        }

        Ok(clean_translation_response(raw_response))
    }
}

/// Check if Ollama is reachable and the model is pulled
pub async fn check_ollama_availability(endpoint: &str, model: &str) -> Result<()> {
    let client = Client::new();
    let url = format!("{}/api/show", endpoint.trim_end_matches('/'));

    let response = client
        .post(&url)
        .json(&json!({ "name": model }))
        .send()
        .await
        .map_err(|e| VttError::Translation(format!("Failed to connect to Ollama: {}", e)))?;

    if response.status().is_success() {
        info!("Ollama model '{}' is available", model);
        Ok(())
    } else {
        Err(VttError::Translation(format!(
            "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
            model, model
        )))
    }
}

/// Pick the translation out of a free-form model reply
fn clean_translation_response(response: &str) -> String {
    let mut candidates = response.lines().map(str::trim).filter(|line| !line.is_empty());

    let preferred = response.lines().map(str::trim).find(|line| {
        line.len() > 3
            && !line.starts_with("Here is")
            && !line.starts_with("Translation:")
            && !line.starts_with("- ")
            && !line.starts_with("* ")
            && !(line.starts_with("**") && line.ends_with("**"))
    });

    preferred
        .or_else(|| candidates.next())
        .unwrap_or(response)
        .trim_matches('"')
        .to_string()
}

/// Language name for prompts; unknown codes are passed through
fn language_code_to_name(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "et" => "Estonian".to_string(),
        "en" => "English".to_string(),
        "fi" => "Finnish".to_string(),
        "ru" => "Russian".to_string(),
        "lv" => "Latvian".to_string(),
        "lt" => "Lithuanian".to_string(),
        "de" => "German".to_string(),
        "fr" => "French".to_string(),
        "es" => "Spanish".to_string(),
        "sv" => "Swedish".to_string(),
        "ja" => "Japanese".to_string(),
        _ => code.to_string(),
    }
}
