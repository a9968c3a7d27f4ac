use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "playlist-transcripts",
    about = "Playlist Transcripts - Download the transcripts of every video in a YouTube playlist",
    version,
    long_about = "A CLI tool that resolves a YouTube playlist, fetches the caption transcript of each video and bundles them into a single zip archive. Videos without transcripts are reported but never stop the run."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the transcripts of a playlist into a zip archive
    Download {
        /// Playlist URL or ID (prompted for if not given)
        #[arg(value_name = "PLAYLIST_URL")]
        url: Option<String>,

        /// Archive path (defaults to "<playlist title>_transcripts.zip" in the output directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Preferred caption language; repeat for fallbacks (overrides config)
        #[arg(short, long = "language", value_name = "LANG")]
        languages: Vec<String>,

        /// Only use manually created captions
        #[arg(long)]
        no_auto_captions: bool,

        /// Pause between videos in milliseconds (overrides config)
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,

        /// Final report format (overrides config)
        #[arg(short, long, value_enum)]
        format: Option<ReportFormat>,
    },

    /// Show or locate the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable summary
    Text,
    /// Machine-readable JSON
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}
