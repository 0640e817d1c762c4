use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use crate::error::{Result, VttError};

/// Placeholders accepted in `source.url_template`
pub const INDEX_PLACEHOLDERS: [&str; 2] = ["{index}", "{}"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub normalize: NormalizeConfig,
    pub translate: TranslateConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Fragment URL with an `{index}` (or `{}`) placeholder
    pub url_template: String,
    /// Per-fragment request timeout in seconds
    pub timeout_secs: u64,
    /// Upper bound on probed indices when no end-of-sequence is seen
    pub max_fragments: u64,
    /// Number of failed fragments in a row that aborts the run
    pub max_consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Canonical document header, kept once
    pub header: String,
    /// Lines containing any of these phrases are dropped
    pub noise_markers: Vec<String>,
    /// Lines starting with any of these prefixes are dropped
    pub noise_prefixes: Vec<String>,
    /// Token marking a cue timing line
    pub timestamp_separator: String,
    /// Exempt blank lines from duplicate removal.
    /// Off by default: blank lines are deduplicated like any other line.
    pub preserve_blank_lines: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Which translator implementation to use
    pub backend: TranslatorBackend,
    /// Base URL of the translation service
    pub endpoint: String,
    /// Model name (Ollama backend only)
    pub model: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// What to do when a single line fails to translate
    pub on_failure: FailurePolicy,
    /// Prefix for lines left untranslated under the `mark` policy
    pub untranslated_marker: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslatorBackend {
    /// Remote: POST each line to a `/translate` endpoint
    Remote,
    /// Ollama: prompt a local LLM through `/api/generate`
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole run on the first failed line
    Abort,
    /// Keep the source line as-is
    KeepOriginal,
    /// Keep the source line behind the untranslated marker
    Mark,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the three artifacts are written to
    pub dir: String,
    pub merged_file: String,
    pub cleaned_file: String,
    pub translated_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty means permissive
    pub cors_origins: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url_template: "https://vod.err.ee/hls/vod/1351583/2/v/fragment-{index}-f4.vtt".to_string(),
            timeout_secs: 30,
            max_fragments: 10_000,
            max_consecutive_failures: 25,
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            header: "WEBVTT".to_string(),
            noise_markers: vec!["ERR Heli tekstiks".to_string()],
            noise_prefixes: vec!["NOTE".to_string()],
            timestamp_separator: "-->".to_string(),
            preserve_blank_lines: false,
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            backend: TranslatorBackend::Remote,
            endpoint: "http://localhost:5000".to_string(),
            model: "llama3.2:3b".to_string(),
            source_language: "et".to_string(),
            target_language: "en".to_string(),
            timeout_secs: 300,
            on_failure: FailurePolicy::Abort,
            untranslated_marker: "[untranslated] ".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "subtitles".to_string(),
            merged_file: "merged_subtitles.vtt".to_string(),
            cleaned_file: "cleaned_subtitles.vtt".to_string(),
            translated_file: "translated_subtitles.vtt".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VttError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| VttError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VttError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VttError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject settings the pipeline cannot run safely with
    pub fn validate(&self) -> Result<()> {
        if !INDEX_PLACEHOLDERS.iter().any(|p| self.source.url_template.contains(p)) {
            return Err(VttError::Config(format!(
                "source.url_template '{}' has no {{index}} placeholder",
                self.source.url_template
            )));
        }
        if self.source.max_fragments == 0 {
            return Err(VttError::Config("source.max_fragments must be greater than 0".to_string()));
        }
        if self.source.max_consecutive_failures == 0 {
            return Err(VttError::Config(
                "source.max_consecutive_failures must be greater than 0".to_string(),
            ));
        }
        if self.source.timeout_secs == 0 || self.translate.timeout_secs == 0 {
            return Err(VttError::Config("timeouts must be greater than 0".to_string()));
        }
        if self.normalize.header.trim().is_empty() {
            return Err(VttError::Config("normalize.header must not be empty".to_string()));
        }
        if self.normalize.timestamp_separator.is_empty() {
            return Err(VttError::Config(
                "normalize.timestamp_separator must not be empty".to_string(),
            ));
        }
        for origin in &self.server.cors_origins {
            if !is_valid_origin(origin) {
                return Err(VttError::Config(format!(
                    "server.cors_origins entry '{}' is not an http(s) origin",
                    origin
                )));
            }
        }
        Ok(())
    }

    /// Extra checks for `serve`: the remote backend must not point back at
    /// the server being started.
    pub fn validate_for_serve(&self) -> Result<()> {
        self.validate()?;

        if self.translate.backend != TranslatorBackend::Remote {
            return Ok(());
        }

        let endpoint = Url::parse(&self.translate.endpoint).map_err(|e| {
            VttError::Config(format!("translate.endpoint '{}' is not a URL: {}", self.translate.endpoint, e))
        })?;
        let endpoint_host = endpoint.host_str().unwrap_or_default();
        let same_port = endpoint.port_or_known_default() == Some(self.server.port);
        let same_host = endpoint_host.eq_ignore_ascii_case(&self.server.host)
            || (is_local_host(endpoint_host) && is_local_host(&self.server.host));

        if same_port && same_host {
            return Err(VttError::Config(format!(
                "translate.endpoint {} is this server ({}:{}); set translate.backend = \"Ollama\" or point the endpoint elsewhere",
                self.translate.endpoint, self.server.host, self.server.port
            )));
        }
        Ok(())
    }
}

fn is_valid_origin(origin: &str) -> bool {
    match Url::parse(origin) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Loopback names and addresses, plus the unspecified address a server may bind
fn is_local_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.parse::<IpAddr>()
        .map(|ip| ip.is_loopback() || ip.is_unspecified())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [source]
            url_template = "http://cdn.example/frag-{}.vtt"

            [translate]
            on_failure = "keep_original"
            backend = "Ollama"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.url_template, "http://cdn.example/frag-{}.vtt");
        assert_eq!(config.source.max_fragments, 10_000);
        assert_eq!(config.translate.on_failure, FailurePolicy::KeepOriginal);
        assert_eq!(config.translate.backend, TranslatorBackend::Ollama);
        assert_eq!(config.normalize.header, "WEBVTT");
        assert_eq!(config.server.port, 5000);
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_template_without_placeholder() {
        let mut config = Config::default();
        config.source.url_template = "http://cdn.example/frag.vtt".to_string();
        assert!(matches!(config.validate(), Err(VttError::Config(_))));
    }

    #[test]
    fn test_rejects_disabled_fuse() {
        let mut config = Config::default();
        config.source.max_consecutive_failures = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.source.max_fragments = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_cors_origin() {
        let mut config = Config::default();
        config.server.cors_origins = vec!["http://localhost:3000".to_string()];
        config.validate().unwrap();

        config.server.cors_origins.push("not an origin".to_string());
        assert!(matches!(config.validate(), Err(VttError::Config(_))));
    }

    #[test]
    fn test_serve_refuses_remote_backend_pointing_at_itself() {
        let config = Config::default();
        assert!(matches!(config.validate_for_serve(), Err(VttError::Config(_))));

        let mut config = Config::default();
        config.server.host = "0.0.0.0".to_string();
        config.translate.endpoint = "http://127.0.0.1:5000/".to_string();
        assert!(config.validate_for_serve().is_err());
    }

    #[test]
    fn test_serve_accepts_distinct_upstream_or_ollama() {
        let mut config = Config::default();
        config.translate.backend = TranslatorBackend::Ollama;
        config.translate.endpoint = "http://localhost:11434".to_string();
        config.validate_for_serve().unwrap();

        let mut config = Config::default();
        config.translate.endpoint = "http://localhost:5001".to_string();
        config.validate_for_serve().unwrap();

        let mut config = Config::default();
        config.translate.endpoint = "http://translator.internal:5000".to_string();
        config.validate_for_serve().unwrap();
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.translate.on_failure = FailurePolicy::Mark;
        config.output.dir = "out".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.translate.on_failure, FailurePolicy::Mark);
        assert_eq!(loaded.output.dir, "out");
        assert_eq!(loaded.normalize.noise_prefixes, vec!["NOTE".to_string()]);
    }
}
