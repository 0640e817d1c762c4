use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::info;

use crate::classify::LineClassifier;
use crate::config::Config;
use crate::document::{Document, Stage};
use crate::error::Result;
use crate::fetch::{FetchLimits, FragmentSource, HttpFragmentSource, SequenceFetcher};
use crate::normalize::Normalizer;
use crate::sink::{ArtifactSink, FileSink};
use crate::translate::{TranslationWalker, Translator, TranslatorFactory};

/// Documents produced by one full run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub raw: Document,
    pub cleaned: Document,
    pub translated: Document,
}

/// Fetch → merge → clean → translate, persisting each stage once it completes
pub struct Pipeline {
    config: Config,
    fetcher: SequenceFetcher,
    normalizer: Normalizer,
    translator: Arc<dyn Translator>,
    sink: Box<dyn ArtifactSink>,
    show_progress: bool,
}

impl Pipeline {
    /// Build the pipeline with HTTP fragment fetching, the configured translator and file output
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let source = HttpFragmentSource::new(&config.source)?;
        let translator: Arc<dyn Translator> =
            Arc::from(TranslatorFactory::create_translator(&config.translate)?);
        let sink = FileSink::new(&config.output);

        Ok(Self::with_components(config, Box::new(source), translator, Box::new(sink)))
    }

    pub fn with_components(
        config: Config,
        source: Box<dyn FragmentSource>,
        translator: Arc<dyn Translator>,
        sink: Box<dyn ArtifactSink>,
    ) -> Self {
        let fetcher = SequenceFetcher::new(source, FetchLimits::from(&config.source));
        let normalizer = Normalizer::new(&config.normalize);

        Self {
            config,
            fetcher,
            normalizer,
            translator,
            sink,
            show_progress: false,
        }
    }

    /// Show a progress bar while translating
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn run(&self) -> Result<PipelineOutput> {
        info!("Starting pipeline for {}", self.config.source.url_template);

        let raw = self.merge().await?;
        let cleaned = self.clean(&raw).await?;
        let translated = self.translate(&cleaned).await?;

        info!("Pipeline completed: {} raw, {} cleaned, {} translated lines",
              raw.len(), cleaned.len(), translated.len());

        Ok(PipelineOutput { raw, cleaned, translated })
    }

    /// Fetch every fragment and persist the merged document
    pub async fn merge(&self) -> Result<Document> {
        let raw = self.fetcher.fetch_all().await?;
        self.sink.write(Stage::Merged, &raw).await?;
        Ok(raw)
    }

    /// Normalize the merged document and persist the result
    pub async fn clean(&self, raw: &Document) -> Result<Document> {
        let cleaned = self.normalizer.clean(raw);
        self.sink.write(Stage::Cleaned, &cleaned).await?;
        Ok(cleaned)
    }

    /// Translate the cleaned document and persist the result.
    /// Nothing is written if the walk aborts.
    pub async fn translate(&self, cleaned: &Document) -> Result<Document> {
        let classifier = LineClassifier::from_config(&self.config.normalize);
        let walker = TranslationWalker::new(self.translator.clone(), classifier, &self.config.translate);

        let progress = if self.show_progress {
            let bar = ProgressBar::new(walker.textual_lines(cleaned) as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let translated = walker.with_progress(progress).translate(cleaned).await?;
        self.sink.write(Stage::Translated, &translated).await?;
        Ok(translated)
    }
}
