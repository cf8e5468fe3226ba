use crate::acquire::error::AcquireError;
use crate::profiles::error::WriteError;
use crate::regions::error::RegionError;
use crate::sources::error::SourceError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
