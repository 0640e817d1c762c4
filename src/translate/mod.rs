// Translation
//
// - Translator: opaque one-line-in, one-line-out translation capability
// - remote: client of a `/translate` HTTP endpoint
// - ollama: prompt-based translation through a local Ollama model
// - walker: applies a translator to the textual lines of a document

pub mod ollama;
pub mod remote;
pub mod walker;

use async_trait::async_trait;

pub use ollama::{check_ollama_availability, OllamaTranslator};
pub use remote::RemoteTranslator;
pub use walker::TranslationWalker;

use crate::config::{TranslateConfig, TranslatorBackend};
use crate::error::Result;

/// Translates a single piece of text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create a translator for the configured backend
    pub fn create_translator(config: &TranslateConfig) -> Result<Box<dyn Translator>> {
        match config.backend {
            TranslatorBackend::Remote => Ok(Box::new(RemoteTranslator::new(config)?)),
            TranslatorBackend::Ollama => Ok(Box::new(OllamaTranslator::new(config)?)),
        }
    }
}
