use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::FailurePolicy;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, merge, clean and translate a fragment sequence
    Run {
        /// Fragment URL template with an {index} placeholder
        #[arg(short, long)]
        url: Option<String>,

        /// Output directory for the merged, cleaned and translated files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// What to do when a line fails to translate
        #[arg(long, value_enum)]
        on_failure: Option<CliFailurePolicy>,

        /// Hide the translation progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Fetch and merge fragments only
    Fetch {
        /// Fragment URL template with an {index} placeholder
        #[arg(short, long)]
        url: Option<String>,

        /// Output directory for the merged file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Clean a merged subtitle file
    Clean {
        /// Merged subtitle file (defaults to the merged artifact in the output directory)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory for the cleaned file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Translate a cleaned subtitle file
    Translate {
        /// Cleaned subtitle file (defaults to the cleaned artifact in the output directory)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory for the translated file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// What to do when a line fails to translate
        #[arg(long, value_enum)]
        on_failure: Option<CliFailurePolicy>,

        /// Hide the translation progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Serve the configured translator over HTTP
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// CLI wrapper for FailurePolicy to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliFailurePolicy {
    Abort,
    KeepOriginal,
    Mark,
}

impl From<CliFailurePolicy> for FailurePolicy {
    fn from(policy: CliFailurePolicy) -> Self {
        match policy {
            CliFailurePolicy::Abort => FailurePolicy::Abort,
            CliFailurePolicy::KeepOriginal => FailurePolicy::KeepOriginal,
            CliFailurePolicy::Mark => FailurePolicy::Mark,
        }
    }
}
