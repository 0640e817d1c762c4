use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::config::OutputConfig;
use crate::document::{Document, Stage};
use crate::error::{Result, VttError};

/// Destination for the per-stage artifacts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Replace the stored artifact for `stage` with `document`
    async fn write(&self, stage: Stage, document: &Document) -> Result<()>;
}

/// Writes each stage to its own file inside the output directory
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    merged_file: String,
    cleaned_file: String,
    translated_file: String,
}

impl FileSink {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            merged_file: config.merged_file.clone(),
            cleaned_file: config.cleaned_file.clone(),
            translated_file: config.translated_file.clone(),
        }
    }

    pub fn path_for(&self, stage: Stage) -> PathBuf {
        let file = match stage {
            Stage::Merged => &self.merged_file,
            Stage::Cleaned => &self.cleaned_file,
            Stage::Translated => &self.translated_file,
        };
        self.dir.join(file)
    }

    /// Load a previously written artifact
    pub async fn read(&self, stage: Stage) -> Result<Document> {
        read_document(self.path_for(stage)).await
    }
}

#[async_trait]
impl ArtifactSink for FileSink {
    async fn write(&self, stage: Stage, document: &Document) -> Result<()> {
        let dir = self.dir.clone();
        let path = self.path_for(stage);
        let text = document.to_text();

        let written = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &text))
            .await
            .map_err(|e| VttError::Io(std::io::Error::other(e)))??;

        info!("Saved {} subtitles to {} ({} lines)", stage, written.display(), document.len());
        Ok(())
    }
}

/// Read a subtitle file into a document, replacing invalid UTF-8
pub async fn read_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(VttError::FileNotFound(path.display().to_string()));
    }

    let bytes = tokio::fs::read(path).await?;
    Ok(Document::from_text(&String::from_utf8_lossy(&bytes)))
}

/// Write to a temp file next to `path`, then rename it over `path`
fn write_atomic(dir: &Path, path: &Path, text: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(text.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| VttError::Io(e.error))?;

    Ok(())
}
