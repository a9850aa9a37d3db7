//! video-dl - A Rust CLI tool for downloading videos embedded in web pages
//!
//! This library fetches a page, locates the `<video>` source inside it, streams the
//! media to disk and optionally hands the result to ffmpeg for MP3 extraction.
//! Series listing pages are expanded into their child pages first.

pub mod cli;
pub mod config;
pub mod download;
pub mod extractors;
pub mod output;
pub mod pipeline;
pub mod transcode;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use download::{MediaDownloader, NoProgress, ProgressObserver, TerminalProgress};
pub use extractors::{ExtractionError, ExtractionStage, LinkExtractor, PageFetcher};
pub use output::resolve_name;
pub use pipeline::{DownloadPipeline, Job};
pub use transcode::{AudioTranscoder, TranscodeRequest};

/// Result type used throughout the library
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error types specific to the downloader
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] extractors::FetchError),

    #[error("Unexpected page layout at {url}: {source}")]
    Extraction {
        url: String,
        #[source]
        source: ExtractionError,
    },

    #[error("Cannot name output for {url}: {source}")]
    Output {
        url: String,
        #[source]
        source: output::OutputError,
    },

    #[error("Download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: download::DownloadError,
    },

    #[error("Audio conversion failed: {0}")]
    Conversion(#[from] transcode::ConversionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),
}
