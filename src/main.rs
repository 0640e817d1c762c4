//! vttstitch - WebVTT fragment merging and translation
//!
//! Entry point: fetches numbered subtitle fragments, merges and cleans them,
//! translates the text lines, or serves the translator over HTTP.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use vttstitch::cli::{Args, Commands, CliFailurePolicy};
use vttstitch::config::{Config, TranslatorBackend};
use vttstitch::document::Stage;
use vttstitch::error::VttError;
use vttstitch::pipeline::Pipeline;
use vttstitch::server;
use vttstitch::sink::{read_document, FileSink};
use vttstitch::translate::{check_ollama_availability, Translator, TranslatorFactory};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;
    info!("Starting vttstitch");

    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Run { url, output_dir, on_failure, no_progress } => {
            apply_source_overrides(&mut config, url, output_dir);
            apply_failure_override(&mut config, on_failure);
            config.validate()?;
            ensure_translator_ready(&config).await?;

            let pipeline = Pipeline::new(config)?.with_progress(!no_progress);
            pipeline.run().await?;
        }
        Commands::Fetch { url, output_dir } => {
            apply_source_overrides(&mut config, url, output_dir);
            config.validate()?;

            Pipeline::new(config)?.merge().await?;
        }
        Commands::Clean { input, output_dir } => {
            apply_source_overrides(&mut config, None, output_dir);
            let raw = match input {
                Some(path) => read_document(&path).await?,
                None => FileSink::new(&config.output).read(Stage::Merged).await?,
            };

            Pipeline::new(config)?.clean(&raw).await?;
        }
        Commands::Translate { input, output_dir, on_failure, no_progress } => {
            apply_source_overrides(&mut config, None, output_dir);
            apply_failure_override(&mut config, on_failure);
            config.validate()?;
            ensure_translator_ready(&config).await?;

            let cleaned = match input {
                Some(path) => read_document(&path).await?,
                None => FileSink::new(&config.output).read(Stage::Cleaned).await?,
            };

            let pipeline = Pipeline::new(config)?.with_progress(!no_progress);
            pipeline.translate(&cleaned).await?;
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate_for_serve()?;
            ensure_translator_ready(&config).await?;

            if config.translate.backend == TranslatorBackend::Remote {
                info!("Forwarding translation requests to {}", config.translate.endpoint);
            }

            let translator: Arc<dyn Translator> =
                Arc::from(TranslatorFactory::create_translator(&config.translate)?);
            server::serve(&config.server, translator).await?;
        }
        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                return Err(VttError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    output.display()
                ))
                .into());
            }
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    info!("vttstitch completed successfully");
    Ok(())
}

/// Explicit path first, then ./config.toml, then built-in defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

fn apply_source_overrides(config: &mut Config, url: Option<String>, output_dir: Option<PathBuf>) {
    if let Some(url) = url {
        config.source.url_template = url;
    }
    if let Some(dir) = output_dir {
        config.output.dir = dir.display().to_string();
    }
}

fn apply_failure_override(config: &mut Config, on_failure: Option<CliFailurePolicy>) {
    if let Some(policy) = on_failure {
        config.translate.on_failure = policy.into();
    }
}

/// Fail fast when the Ollama model is not available
async fn ensure_translator_ready(config: &Config) -> Result<()> {
    if config.translate.backend == TranslatorBackend::Ollama {
        check_ollama_availability(&config.translate.endpoint, &config.translate.model).await?;
    }
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".vttstitch").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation
    let file_appender = rolling::daily(&log_dir, "vttstitch.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("vttstitch.log").display());

    Ok(())
}
