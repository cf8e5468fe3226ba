use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Cannot derive a file name from URL '{0}'")]
    InvalidUrl(String),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download or decompression of {0} failed")]
    DownloadIo(String, #[source] std::io::Error),

    #[error("Failed to move downloaded file into place at '{0}'")]
    Persist(PathBuf, #[source] tempfile::PersistError),

    #[error("Failed to open archive '{0}'")]
    ArchiveOpen(PathBuf, #[source] std::io::Error),

    #[error("Layer archive {0} is not a .zip file")]
    UnsupportedArchive(String),

    #[error("Failed to extract archive '{0}'")]
    Extract(PathBuf, #[source] zip::result::ZipError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
