//! Playlist Transcripts - bundle the transcripts of a whole YouTube playlist
//!
//! This library resolves a playlist with yt-dlp's flat extraction, fetches the
//! caption transcript of every video one at a time and collects them into a
//! single zip archive. Videos without a transcript are reported, never fatal.

pub mod archive;
pub mod batch;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod pipeline;
pub mod utils;

pub use archive::{ArchiveBuilder, ArchiveError};
pub use batch::{BatchProcessor, BatchResult, BatchRun, ProcessingOutcome, ProgressEvent, ProgressSink};
pub use cli::{Cli, Commands, ReportFormat};
pub use config::Config;
pub use extractors::{
    Playlist, PlaylistResolver, ResolutionError, TranscriptError, TranscriptFetcher,
    TranscriptSegment, VideoDescriptor,
};
pub use pipeline::{PipelineReport, PlaylistPipeline};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Errors that end a run before or while the archive is produced
#[derive(thiserror::Error, Debug)]
pub enum PlaylistTranscriptsError {
    #[error("Error processing playlist: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Archive creation failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error("File operation failed: {0}")]
    FileError(#[from] std::io::Error),
}
