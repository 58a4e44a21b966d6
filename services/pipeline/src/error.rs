//! Error types for the ingestion sources.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("upstream returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error reading CSV: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV header unreadable: {0}")]
    Header(#[from] csv::Error),
}

/// Failure of one source in the fallback chain.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Csv(#[from] CsvError),
}
