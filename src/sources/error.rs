use crate::acquire::error::AcquireError;
use crate::grid::error::GridError;
use crate::types::variable::ClimateVariable;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open dataset '{0}'")]
    DatasetOpen(PathBuf, #[source] std::io::Error),

    #[error("Unsupported dataset format for '{0}' (expected .nc, .csv or .parquet)")]
    UnsupportedFormat(PathBuf),

    #[error(
        "Reading NetCDF dataset '{0}' requires building with `--features netcdf`; \
         convert it to .csv or .parquet otherwise"
    )]
    NetcdfDisabled(PathBuf),

    #[cfg(feature = "netcdf")]
    #[error("NetCDF error reading '{0}'")]
    Netcdf(PathBuf, #[source] netcdf::Error),

    #[error("Failed to read table '{0}'")]
    Table(PathBuf, #[source] PolarsError),

    #[error("Variable '{variable}' not found in dataset '{path}'")]
    MissingVariable { path: PathBuf, variable: String },

    #[error("Dataset '{path}' has no {dimension} coordinate")]
    MissingDimension {
        path: PathBuf,
        dimension: &'static str,
    },

    #[error("Dataset '{path}' has unsupported dimension layout {dimensions:?}")]
    UnsupportedLayout {
        path: PathBuf,
        dimensions: Vec<String>,
    },

    #[error("Invalid grid in dataset '{path}'")]
    Grid {
        path: PathBuf,
        #[source]
        source: GridError,
    },

    #[error("Unparseable time value '{value}' in dataset '{path}'")]
    InvalidTime { path: PathBuf, value: String },

    #[error("Unsupported time units '{units}' in dataset '{path}'")]
    UnsupportedTimeUnits { path: PathBuf, units: String },

    #[error("Failed to decode raster '{0}'")]
    RasterDecode(PathBuf, #[source] tiff::TiffError),

    #[error("Raster '{0}' carries no georeferencing tags")]
    MissingGeoreference(PathBuf),

    #[error("Raster '{0}' uses an unsupported sample format")]
    UnsupportedSampleFormat(PathBuf),

    #[error("Missing {variable} raster for month {month}: no '{file_name}' under '{dir}'")]
    MissingLayer {
        variable: ClimateVariable,
        month: u32,
        file_name: String,
        dir: PathBuf,
    },

    #[error("Invalid in-memory {variable} grid")]
    InvalidLayers {
        variable: ClimateVariable,
        #[source]
        source: GridError,
    },

    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
