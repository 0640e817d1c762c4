use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::{info, warn};

use crate::classify::{LineClassifier, LineKind};
use crate::config::{FailurePolicy, TranslateConfig};
use crate::document::Document;
use crate::error::{Result, VttError};
use super::Translator;

/// Replaces textual lines with their translation, one line at a time.
///
/// Output has exactly as many lines as the input and every structural
/// line stays verbatim at its original position.
pub struct TranslationWalker {
    translator: Arc<dyn Translator>,
    classifier: LineClassifier,
    on_failure: FailurePolicy,
    untranslated_marker: String,
    progress: Option<ProgressBar>,
}

impl TranslationWalker {
    pub fn new(translator: Arc<dyn Translator>, classifier: LineClassifier, config: &TranslateConfig) -> Self {
        Self {
            translator,
            classifier,
            on_failure: config.on_failure,
            untranslated_marker: config.untranslated_marker.clone(),
            progress: None,
        }
    }

    /// Advance `progress` once per textual line
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Number of lines the walker will send to the translator
    pub fn textual_lines(&self, document: &Document) -> usize {
        document
            .iter()
            .filter(|line| self.classifier.classify(line) == LineKind::Textual)
            .count()
    }

    pub async fn translate(&self, cleaned: &Document) -> Result<Document> {
        let total = self.textual_lines(cleaned);
        let mut translated = Vec::with_capacity(cleaned.len());
        let mut done = 0usize;
        let mut failed = 0usize;

        info!("Translating {} of {} lines ({:?} on failure)", total, cleaned.len(), self.on_failure);

        for (position, line) in cleaned.iter().enumerate() {
            if self.classifier.classify(line) == LineKind::Structural {
                translated.push(line.to_string());
                continue;
            }

            done += 1;
            let outcome = self.translator.translate(line).await.and_then(|translation| {
                let translation = single_line(&translation);
                if translation.is_empty() {
                    Err(VttError::Translation("translator returned empty text".to_string()))
                } else {
                    Ok(translation)
                }
            });

            match outcome {
                Ok(translation) => {
                    info!("Translated [{}/{}]: '{}' -> '{}'", done, total, line.trim(), translation);
                    translated.push(translation);
                }
                Err(e) => {
                    let reason = match e {
                        VttError::Translation(message) => message,
                        other => other.to_string(),
                    };
                    failed += 1;

                    match self.on_failure {
                        FailurePolicy::Abort => {
                            if let Some(progress) = &self.progress {
                                progress.abandon();
                            }
                            return Err(VttError::Translation(format!(
                                "line {} ('{}'): {}",
                                position + 1,
                                line.trim(),
                                reason
                            )));
                        }
                        FailurePolicy::KeepOriginal => {
                            warn!("Keeping line {} untranslated: {}", position + 1, reason);
                            translated.push(line.to_string());
                        }
                        FailurePolicy::Mark => {
                            warn!("Marking line {} untranslated: {}", position + 1, reason);
                            translated.push(format!("{}{}", self.untranslated_marker, line));
                        }
                    }
                }
            }

            if let Some(progress) = &self.progress {
                progress.inc(1);
            }
        }

        if let Some(progress) = &self.progress {
            progress.finish();
        }
        if failed > 0 {
            warn!("{} of {} lines could not be translated", failed, total);
        }

        Ok(Document::new(translated))
    }
}

/// Collapse a translation onto one line so the cue keeps its line count
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::MockTranslator;

    const CLEANED: &str = "WEBVTT\n\n1\n00:00:00.000 --> 00:00:01.000\nTere\nKuidas läheb?\n2\n00:00:01.000 --> 00:00:02.000\nHead aega";

    fn walker(translator: MockTranslator, on_failure: FailurePolicy) -> TranslationWalker {
        let config = TranslateConfig {
            on_failure,
            ..TranslateConfig::default()
        };
        TranslationWalker::new(Arc::new(translator), LineClassifier::default(), &config)
    }

    fn upper() -> MockTranslator {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .returning(|text| Ok(text.to_uppercase()));
        translator
    }

    #[tokio::test]
    async fn test_structural_lines_pass_through() {
        let cleaned = Document::from_text(CLEANED);
        let translated = walker(upper(), FailurePolicy::Abort)
            .translate(&cleaned)
            .await
            .unwrap();

        assert_eq!(translated.len(), cleaned.len());
        assert_eq!(
            translated.lines(),
            &[
                "WEBVTT",
                "",
                "1",
                "00:00:00.000 --> 00:00:01.000",
                "TERE",
                "KUIDAS LÄHEB?",
                "2",
                "00:00:01.000 --> 00:00:02.000",
                "HEAD AEGA",
            ]
        );
    }

    #[tokio::test]
    async fn test_translator_called_once_per_textual_line() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .times(3)
            .returning(|_| Ok("x".to_string()));

        let cleaned = Document::from_text(CLEANED);
        let walker = walker(translator, FailurePolicy::Abort);
        assert_eq!(walker.textual_lines(&cleaned), 3);
        walker.translate(&cleaned).await.unwrap();
    }

    #[tokio::test]
    async fn test_multiline_translation_is_flattened() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .returning(|_| Ok("Hello\n  there \n\n".to_string()));

        let cleaned = Document::from_text("1\n00:00:00.000 --> 00:00:01.000\nTere");
        let translated = walker(translator, FailurePolicy::Abort)
            .translate(&cleaned)
            .await
            .unwrap();

        assert_eq!(translated.lines(), &["1", "00:00:00.000 --> 00:00:01.000", "Hello there"]);
    }

    #[tokio::test]
    async fn test_blank_translation_never_becomes_a_separator() {
        let blank = || {
            let mut translator = MockTranslator::new();
            translator
                .expect_translate()
                .returning(|_| Ok("  \n".to_string()));
            translator
        };
        let cleaned = Document::from_text(
            "1\n00:00:00.000 --> 00:00:01.000\nTere\n2\n00:00:01.000 --> 00:00:02.000\nHead aega",
        );

        let err = walker(blank(), FailurePolicy::Abort)
            .translate(&cleaned)
            .await
            .unwrap_err();
        assert!(matches!(err, VttError::Translation(message) if message.contains("empty text")));

        let kept = walker(blank(), FailurePolicy::KeepOriginal)
            .translate(&cleaned)
            .await
            .unwrap();
        assert_eq!(kept, cleaned);

        let marked = walker(blank(), FailurePolicy::Mark)
            .translate(&cleaned)
            .await
            .unwrap();
        assert_eq!(marked.lines()[2], "[untranslated] Tere");
        assert_eq!(marked.lines()[5], "[untranslated] Head aega");
        let classifier = LineClassifier::default();
        assert!(marked.iter().all(|line| !line.trim().is_empty()));
        assert_eq!(classifier.classify(&marked.lines()[2]), LineKind::Textual);
    }

    fn failing_on(bad: &'static str) -> MockTranslator {
        let mut translator = MockTranslator::new();
        translator.expect_translate().returning(move |text| {
            if text == bad {
                Err(VttError::Translation("model unavailable".to_string()))
            } else {
                Ok(format!("<{}>", text))
            }
        });
        translator
    }

    #[tokio::test]
    async fn test_abort_policy_fails_whole_walk() {
        let err = walker(failing_on("Kuidas läheb?"), FailurePolicy::Abort)
            .translate(&Document::from_text(CLEANED))
            .await
            .unwrap_err();

        match err {
            VttError::Translation(message) => {
                assert!(message.contains("line 6"), "{}", message);
                assert!(message.contains("model unavailable"), "{}", message);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_keep_original_policy() {
        let cleaned = Document::from_text(CLEANED);
        let translated = walker(failing_on("Kuidas läheb?"), FailurePolicy::KeepOriginal)
            .translate(&cleaned)
            .await
            .unwrap();

        assert_eq!(translated.len(), cleaned.len());
        assert_eq!(translated.lines()[4], "<Tere>");
        assert_eq!(translated.lines()[5], "Kuidas läheb?");
        assert_eq!(translated.lines()[8], "<Head aega>");
    }

    #[tokio::test]
    async fn test_mark_policy() {
        let cleaned = Document::from_text(CLEANED);
        let translated = walker(failing_on("Tere"), FailurePolicy::Mark)
            .translate(&cleaned)
            .await
            .unwrap();

        assert_eq!(translated.len(), cleaned.len());
        assert_eq!(translated.lines()[4], "[untranslated] Tere");
        assert_eq!(translated.lines()[5], "<Kuidas läheb?>");
    }

    #[tokio::test]
    async fn test_empty_document() {
        let mut translator = MockTranslator::new();
        translator.expect_translate().never();

        let translated = walker(translator, FailurePolicy::Abort)
            .translate(&Document::default())
            .await
            .unwrap();
        assert!(translated.is_empty());
    }
}
