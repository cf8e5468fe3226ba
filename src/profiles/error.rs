use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode profile document as JSON")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write profile document '{0}'")]
    OutputWrite(PathBuf, #[source] std::io::Error),
}
